//! Inbound adapters: the HTTP API and CSV account seeding.

pub mod csv;
pub mod http;
