//! Time-weighted yield accrual.
//!
//! A window's yield is
//! `principal * rate * elapsed / (RATE_DENOMINATOR * SECONDS_PER_YEAR)`,
//! truncated. The triple product is formed in a 256-bit intermediate, so it
//! cannot overflow for any `u64` inputs; only the quotient is narrowed to `u128`.
//!
//! Every mutation is modelled as [`close_window`] followed by [`open_window`].

use lockpool_core::constants::{RATE_DENOMINATOR, SECONDS_PER_YEAR};
use lockpool_core::error::LedgerError;
use lockpool_core::types::StakeRecord;
use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer.
    pub struct U256(4);
}

/// `RATE_DENOMINATOR * SECONDS_PER_YEAR`.
const YEAR_DENOMINATOR: u64 = RATE_DENOMINATOR * SECONDS_PER_YEAR;

/// Yield earned by `principal` at `rate_bps` over `elapsed` seconds.
///
/// Truncates toward zero; the pool keeps the remainder.
pub fn window_yield(principal: u64, rate_bps: u64, elapsed: u64) -> Result<u128, LedgerError> {
    if principal == 0 || rate_bps == 0 || elapsed == 0 {
        return Ok(0);
    }
    // < 2^192: cannot overflow 256 bits.
    let product = U256::from(principal) * U256::from(rate_bps) * U256::from(elapsed);
    let quotient = product / U256::from(YEAR_DENOMINATOR);
    if quotient > U256::from(u128::MAX) {
        return Err(LedgerError::ArithmeticOverflow);
    }
    Ok(quotient.as_u128())
}

/// Seconds elapsed in the record's current window. A clock reading earlier
/// than the window start counts as zero.
pub fn elapsed(record: &StakeRecord, now: u64) -> u64 {
    now.saturating_sub(record.window_start)
}

/// Carry plus the yield of the still-open window, without mutating anything.
pub fn pending_yield(record: &StakeRecord, now: u64) -> Result<u128, LedgerError> {
    let open = window_yield(record.principal, record.rate_snapshot, elapsed(record, now))?;
    record
        .accrued_carry
        .checked_add(open)
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// Finalize the open window into the carry. The returned record's window
/// starts at `now` but still holds the old rate snapshot.
pub fn close_window(record: &StakeRecord, now: u64) -> Result<StakeRecord, LedgerError> {
    Ok(StakeRecord {
        accrued_carry: pending_yield(record, now)?,
        window_start: now,
        ..*record
    })
}

/// Start a fresh window at `now` with the given rate snapshot.
pub fn open_window(record: StakeRecord, rate_bps: u64, now: u64) -> StakeRecord {
    StakeRecord {
        rate_snapshot: rate_bps,
        window_start: now,
        ..record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockpool_core::constants::{MAX_RATE_BPS, SECONDS_PER_DAY};
    use proptest::prelude::*;

    fn record(principal: u64, rate: u64, start: u64) -> StakeRecord {
        StakeRecord {
            principal,
            window_start: start,
            accrued_carry: 0,
            rate_snapshot: rate,
            lock_anchor: start,
        }
    }

    // --- window_yield ---

    #[test]
    fn full_year_at_ten_percent() {
        assert_eq!(window_yield(1_000_000, 1_000, SECONDS_PER_YEAR).unwrap(), 100_000);
    }

    #[test]
    fn zero_inputs_yield_nothing() {
        assert_eq!(window_yield(0, 1_000, 100).unwrap(), 0);
        assert_eq!(window_yield(100, 0, 100).unwrap(), 0);
        assert_eq!(window_yield(100, 1_000, 0).unwrap(), 0);
    }

    #[test]
    fn truncates_toward_zero() {
        // 100 units at 10% for one day: 100 * 1000 * 86400 / 315360000000 = 0.027
        assert_eq!(window_yield(100, 1_000, SECONDS_PER_DAY).unwrap(), 0);
        // 1_000_000 units for one day: 273.97 -> 273
        assert_eq!(window_yield(1_000_000, 1_000, SECONDS_PER_DAY).unwrap(), 273);
    }

    #[test]
    fn max_principal_for_a_decade_does_not_overflow() {
        let y = window_yield(u64::MAX, MAX_RATE_BPS, 10 * SECONDS_PER_YEAR).unwrap();
        // 100x per year over ten years: 1000x principal.
        assert_eq!(y, u64::MAX as u128 * 1_000);
    }

    #[test]
    fn extreme_inputs_still_fit() {
        assert!(window_yield(u64::MAX, MAX_RATE_BPS, u64::MAX).is_ok());
    }

    #[test]
    fn oversized_rate_reports_overflow() {
        assert_eq!(
            window_yield(u64::MAX, u64::MAX, u64::MAX),
            Err(LedgerError::ArithmeticOverflow)
        );
    }

    // --- pending_yield ---

    #[test]
    fn pending_is_zero_at_window_start() {
        let rec = record(1_000, 990, 500);
        assert_eq!(pending_yield(&rec, 500).unwrap(), 0);
    }

    #[test]
    fn pending_includes_carry() {
        let mut rec = record(1_000_000, 1_000, 0);
        rec.accrued_carry = 5;
        assert_eq!(pending_yield(&rec, SECONDS_PER_DAY).unwrap(), 278);
    }

    #[test]
    fn clock_regression_accrues_nothing() {
        let rec = record(1_000_000, 1_000, 1_000);
        assert_eq!(pending_yield(&rec, 10).unwrap(), 0);
    }

    // --- close_window / open_window ---

    #[test]
    fn close_moves_window_into_carry() {
        let rec = record(1_000_000, 1_000, 0);
        let closed = close_window(&rec, SECONDS_PER_DAY).unwrap();
        assert_eq!(closed.accrued_carry, 273);
        assert_eq!(closed.window_start, SECONDS_PER_DAY);
        assert_eq!(closed.rate_snapshot, 1_000);
        assert_eq!(pending_yield(&closed, SECONDS_PER_DAY).unwrap(), 273);
    }

    #[test]
    fn open_replaces_snapshot_only() {
        let rec = record(1_000_000, 1_000, 0);
        let reopened = open_window(rec, 500, 42);
        assert_eq!(reopened.rate_snapshot, 500);
        assert_eq!(reopened.window_start, 42);
        assert_eq!(reopened.principal, rec.principal);
        assert_eq!(reopened.lock_anchor, rec.lock_anchor);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn yield_monotonic_in_time(
            principal in 1u64..=u64::MAX,
            rate in 1u64..=MAX_RATE_BPS,
            a in 0u64..=100 * SECONDS_PER_YEAR,
            b in 0u64..=100 * SECONDS_PER_YEAR,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(window_yield(principal, rate, lo).unwrap() <= window_yield(principal, rate, hi).unwrap());
        }

        #[test]
        fn yield_never_exceeds_exact_value(
            principal in 1u64..=u64::MAX,
            rate in 1u64..=MAX_RATE_BPS,
            elapsed in 0u64..=u64::MAX,
        ) {
            let y = U256::from(window_yield(principal, rate, elapsed).unwrap());
            let exact_num = U256::from(principal) * U256::from(rate) * U256::from(elapsed);
            prop_assert!(y * U256::from(YEAR_DENOMINATOR) <= exact_num);
            prop_assert!((y + U256::one()) * U256::from(YEAR_DENOMINATOR) > exact_num);
        }

        #[test]
        fn split_windows_never_beat_one_window(
            principal in 1u64..=1_000_000_000_000u64,
            rate in 1u64..=10_000u64,
            a in 0u64..=SECONDS_PER_YEAR,
            b in 0u64..=SECONDS_PER_YEAR,
        ) {
            let whole = window_yield(principal, rate, a + b).unwrap();
            let split = window_yield(principal, rate, a).unwrap() + window_yield(principal, rate, b).unwrap();
            prop_assert!(split <= whole);
        }

        #[test]
        fn meaningful_yield_is_visible(principal in 1_000_000u64..=u64::MAX) {
            // At 10% a 1e6 principal earns > 1 unit per 4 hours.
            let y = window_yield(principal, 1_000, 4 * 3_600).unwrap();
            prop_assert!(y > 0);
        }
    }
}
