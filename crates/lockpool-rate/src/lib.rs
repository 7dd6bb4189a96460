//! # lockpool-rate: pool-wide decaying reward rate.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! The rate a window snapshots is a pure function of the pool's total locked
//! value:
//! - **Linear decay**: one basis point lost per `units_per_step` locked.
//! - **Hyperbolic decay**: the rate halves once `half_rate_locked` is locked.
//! - **Piecewise decay**: a configured breakpoint table with linear
//!   interpolation between entries.
//!
//! Every curve is clamped into `[minimum, initial]`, so the floor is reached
//! exactly at a finite total rather than approached asymptotically.

pub mod curve;
pub mod engine;

pub use engine::DecayingRate;
