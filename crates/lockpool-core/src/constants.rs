//! Ledger constants. Rates are in basis points per year; amounts in asset base units.

/// Denominator of every rate value (100% = 10,000 basis points).
pub const RATE_DENOMINATOR: u64 = 10_000;

/// Number of seconds in a day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Number of seconds in a year (365 days). Accrual treats rates as annual.
pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

/// Upper bound on any configured rate (10,000% per year).
///
/// Keeps `principal * rate * elapsed / (RATE_DENOMINATOR * SECONDS_PER_YEAR)`
/// inside `u128` for every `u64` principal and elapsed time.
pub const MAX_RATE_BPS: u64 = 1_000_000;

/// Penalty percentages are expressed out of this value.
pub const PERCENT_DENOMINATOR: u64 = 100;

pub const DEFAULT_INITIAL_RATE_BPS: u64 = 1_000;
pub const DEFAULT_MINIMUM_RATE_BPS: u64 = 10;

/// Locked units per one-basis-point step of the default linear curve.
pub const DEFAULT_UNITS_PER_STEP: u64 = 100;

/// Default minimum lock duration: 7 days.
pub const DEFAULT_MIN_LOCK_SECS: u64 = 7 * SECONDS_PER_DAY;

pub const DEFAULT_EMERGENCY_PENALTY_PERCENT: u8 = 10;
