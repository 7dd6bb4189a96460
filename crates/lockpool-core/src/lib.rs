//! # lockpool-core
//! Foundation types, configuration and traits for the Lockpool ledger.

pub mod config;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
