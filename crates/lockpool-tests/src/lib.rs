//! Scenario and adversarial test suite for Lockpool.
//!
//! Integration tests live under `tests/` and drive the pool end to end
//! through the in-memory collaborators.

pub mod helpers;
