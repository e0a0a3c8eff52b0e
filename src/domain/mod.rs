//! Domain types and the ports the payment core depends on.

pub mod checkout;
pub mod phone;
pub mod ports;
pub mod transaction;
pub mod user;
pub mod wallet;
