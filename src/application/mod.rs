//! Application layer orchestrating the payment and wallet flows.
//!
//! Services here depend only on the domain ports, so each can run against the
//! in-memory adapters in tests and the persistent ones in production.

pub mod activation;
pub mod callback;
pub mod checkout;
pub mod locks;
pub mod wallet;
