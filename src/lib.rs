pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

#[cfg(test)]
pub(crate) mod test_support;
