//! Rate engine implementing the [`RateModel`] trait.
//!
//! Provides the production decaying rate: a configured [`RateCurve`]
//! evaluated in integer arithmetic and clamped into `[minimum, initial]`.

use lockpool_core::config::{PoolConfig, RateCurve};
use lockpool_core::error::ConfigError;
use lockpool_core::traits::RateModel;
use tracing::debug;

use crate::curve;

/// The production rate model.
///
/// Implements [`RateModel`] with:
/// - Configurable linear, hyperbolic or piecewise decay
/// - Clamping to the configured floor and ceiling
/// - No mutable state; safe to call on every mutation and query
#[derive(Debug, Clone)]
pub struct DecayingRate {
    initial: u64,
    minimum: u64,
    curve: RateCurve,
}

impl DecayingRate {
    /// Build a rate model from a pool configuration.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] reported by [`PoolConfig::validate`].
    pub fn from_config(config: &PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            initial = config.initial_rate_bps,
            minimum = config.minimum_rate_bps,
            curve = ?config.curve,
            "rate model configured"
        );
        Ok(Self {
            initial: config.initial_rate_bps,
            minimum: config.minimum_rate_bps,
            curve: config.curve.clone(),
        })
    }

    /// The configured curve.
    pub fn curve(&self) -> &RateCurve {
        &self.curve
    }

    fn raw_rate(&self, total_locked: u128) -> u64 {
        match &self.curve {
            RateCurve::Linear { units_per_step } => {
                curve::linear(self.initial, *units_per_step, total_locked)
            }
            RateCurve::Hyperbolic { half_rate_locked } => {
                curve::hyperbolic(self.initial, *half_rate_locked, total_locked)
            }
            RateCurve::Piecewise { points } => curve::piecewise(self.initial, points, total_locked),
        }
    }
}

impl Default for DecayingRate {
    fn default() -> Self {
        let config = PoolConfig::default();
        Self {
            initial: config.initial_rate_bps,
            minimum: config.minimum_rate_bps,
            curve: config.curve,
        }
    }
}

impl RateModel for DecayingRate {
    fn rate(&self, total_locked: u128) -> u64 {
        self.raw_rate(total_locked).clamp(self.minimum, self.initial)
    }

    fn initial_rate(&self) -> u64 {
        self.initial
    }

    fn minimum_rate(&self) -> u64 {
        self.minimum
    }
}
