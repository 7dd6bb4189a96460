//! Pool configuration.
//!
//! Provides [`PoolConfig`] with defaults for the rate curve, lock duration and
//! emergency penalty. Configuration is immutable once a pool is built; call
//! [`PoolConfig::validate`] (the pool constructors do) before use.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EMERGENCY_PENALTY_PERCENT, DEFAULT_INITIAL_RATE_BPS, DEFAULT_MINIMUM_RATE_BPS,
    DEFAULT_MIN_LOCK_SECS, DEFAULT_UNITS_PER_STEP, MAX_RATE_BPS, PERCENT_DENOMINATOR,
};
use crate::error::ConfigError;

/// Shape of the pool-wide rate decay as total locked value grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateCurve {
    /// `initial - locked / units_per_step`.
    Linear { units_per_step: u64 },
    /// `initial * h / (h + locked)`.
    Hyperbolic { half_rate_locked: u64 },
    /// Linear interpolation between `(locked, rate)` breakpoints, starting at
    /// `(0, initial)`. The last rate holds beyond the final breakpoint.
    Piecewise { points: Vec<(u64, u64)> },
}

impl Default for RateCurve {
    fn default() -> Self {
        Self::Linear {
            units_per_step: DEFAULT_UNITS_PER_STEP,
        }
    }
}

/// Configuration for a pool instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Rate at zero total locked, in basis points per year.
    pub initial_rate_bps: u64,
    /// Floor of the rate curve, in basis points per year.
    pub minimum_rate_bps: u64,
    pub curve: RateCurve,
    /// Seconds after the latest deposit before ordinary withdrawal is allowed.
    pub min_lock_secs: u64,
    /// Share of principal retained by the pool on emergency exit (0-100).
    pub emergency_penalty_percent: u8,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_rate_bps: DEFAULT_INITIAL_RATE_BPS,
            minimum_rate_bps: DEFAULT_MINIMUM_RATE_BPS,
            curve: RateCurve::default(),
            min_lock_secs: DEFAULT_MIN_LOCK_SECS,
            emergency_penalty_percent: DEFAULT_EMERGENCY_PENALTY_PERCENT,
        }
    }
}

impl PoolConfig {
    /// Check rate bounds, penalty range and curve parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_rate_bps > MAX_RATE_BPS {
            return Err(ConfigError::RateTooHigh(self.initial_rate_bps));
        }
        if self.minimum_rate_bps > self.initial_rate_bps {
            return Err(ConfigError::MinimumAboveInitial {
                minimum: self.minimum_rate_bps,
                initial: self.initial_rate_bps,
            });
        }
        if u64::from(self.emergency_penalty_percent) > PERCENT_DENOMINATOR {
            return Err(ConfigError::PenaltyOutOfRange(self.emergency_penalty_percent));
        }
        self.validate_curve()
    }

    fn validate_curve(&self) -> Result<(), ConfigError> {
        match &self.curve {
            RateCurve::Linear { units_per_step } => {
                if *units_per_step == 0 {
                    return Err(ConfigError::InvalidCurve("units_per_step must be positive".into()));
                }
            }
            RateCurve::Hyperbolic { half_rate_locked } => {
                if *half_rate_locked == 0 {
                    return Err(ConfigError::InvalidCurve("half_rate_locked must be positive".into()));
                }
            }
            RateCurve::Piecewise { points } => {
                let Some(&(_, last_rate)) = points.last() else {
                    return Err(ConfigError::InvalidCurve("piecewise curve has no points".into()));
                };
                let mut prev = (0u64, self.initial_rate_bps);
                for (i, &(locked, rate)) in points.iter().enumerate() {
                    if locked <= prev.0 {
                        return Err(ConfigError::InvalidCurve(format!(
                            "point {i}: locked {locked} not above {}",
                            prev.0
                        )));
                    }
                    if rate > prev.1 {
                        return Err(ConfigError::InvalidCurve(format!(
                            "point {i}: rate {rate} rises above {}",
                            prev.1
                        )));
                    }
                    prev = (locked, rate);
                }
                if last_rate > self.minimum_rate_bps {
                    return Err(ConfigError::InvalidCurve(format!(
                        "last rate {last_rate} never reaches floor {}",
                        self.minimum_rate_bps
                    )));
                }
            }
        }
        Ok(())
    }
}
