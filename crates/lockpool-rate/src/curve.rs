//! Unclamped fixed-point rate curves.
//!
//! Each function maps a total locked value to a raw rate in basis points.
//! Raw values may fall below the configured floor; [`DecayingRate`](crate::DecayingRate)
//! clamps them. All intermediates are `u128`.

/// `initial - locked / units_per_step`, saturating at zero.
///
/// `units_per_step` must be non-zero (enforced by config validation).
pub fn linear(initial: u64, units_per_step: u64, locked: u128) -> u64 {
    let steps = locked / units_per_step.max(1) as u128;
    if steps >= initial as u128 {
        return 0;
    }
    initial - steps as u64
}

/// `initial * h / (h + locked)`, truncating.
///
/// `initial` is at most `MAX_RATE_BPS` (~2^20) and `h` a `u64`, so the
/// numerator fits `u128`. The denominator saturates for absurd totals,
/// which only drives the result lower.
pub fn hyperbolic(initial: u64, half_rate_locked: u64, locked: u128) -> u64 {
    let h = half_rate_locked.max(1) as u128;
    let num = initial as u128 * h;
    (num / h.saturating_add(locked)) as u64
}

/// Linear interpolation over `(locked, rate)` breakpoints.
///
/// The table implicitly starts at `(0, initial)`. Breakpoints are strictly
/// increasing in `locked` and non-increasing in `rate` (enforced by config
/// validation). Beyond the last breakpoint its rate holds.
pub fn piecewise(initial: u64, points: &[(u64, u64)], locked: u128) -> u64 {
    let mut lo = (0u128, initial);
    for &(x, rate) in points {
        let x = x as u128;
        if locked < x {
            let span = x - lo.0;
            let frac = locked - lo.0;
            let drop = lo.1.saturating_sub(rate) as u128;
            // drop < 2^64, frac < span < 2^64: the product fits u128.
            return lo.1 - (drop * frac / span) as u64;
        }
        lo = (x, rate);
    }
    lo.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TABLE: [(u64, u64); 3] = [(1_000, 600), (5_000, 200), (20_000, 10)];

    #[test]
    fn linear_at_zero_is_initial() {
        assert_eq!(linear(1_000, 100, 0), 1_000);
    }

    #[test]
    fn linear_steps_down() {
        assert_eq!(linear(1_000, 100, 99), 1_000);
        assert_eq!(linear(1_000, 100, 100), 999);
        assert_eq!(linear(1_000, 100, 1_000), 990);
    }

    #[test]
    fn linear_saturates_at_zero() {
        assert_eq!(linear(1_000, 100, 100_000), 0);
        assert_eq!(linear(1_000, 100, u128::MAX), 0);
    }

    #[test]
    fn hyperbolic_halves_at_parameter() {
        assert_eq!(hyperbolic(1_000, 5_000, 0), 1_000);
        assert_eq!(hyperbolic(1_000, 5_000, 5_000), 500);
        assert_eq!(hyperbolic(1_000, 5_000, 15_000), 250);
    }

    #[test]
    fn hyperbolic_huge_total() {
        assert_eq!(hyperbolic(1_000, 5_000, u128::MAX), 0);
    }

    #[test]
    fn piecewise_hits_every_breakpoint() {
        assert_eq!(piecewise(1_000, &TABLE, 0), 1_000);
        for &(x, rate) in &TABLE {
            assert_eq!(piecewise(1_000, &TABLE, x as u128), rate, "breakpoint {x}");
        }
    }

    #[test]
    fn piecewise_interpolates_midpoint() {
        // Halfway between (0, 1000) and (1000, 600).
        assert_eq!(piecewise(1_000, &TABLE, 500), 800);
        // Quarter of the way between (1000, 600) and (5000, 200).
        assert_eq!(piecewise(1_000, &TABLE, 2_000), 500);
    }

    #[test]
    fn piecewise_holds_last_rate() {
        assert_eq!(piecewise(1_000, &TABLE, 20_001), 10);
        assert_eq!(piecewise(1_000, &TABLE, u128::MAX), 10);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn linear_non_increasing(a in any::<u128>(), b in any::<u128>(), units in 1u64..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(linear(1_000, units, lo) >= linear(1_000, units, hi));
        }

        #[test]
        fn hyperbolic_non_increasing(a in any::<u128>(), b in any::<u128>(), h in 1u64..u64::MAX) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(hyperbolic(1_000_000, h, lo) >= hyperbolic(1_000_000, h, hi));
        }

        #[test]
        fn piecewise_non_increasing(a in 0u128..50_000, b in 0u128..50_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(piecewise(1_000, &TABLE, lo) >= piecewise(1_000, &TABLE, hi));
        }

        #[test]
        fn curves_never_exceed_initial(x in any::<u128>()) {
            prop_assert!(linear(1_000, 7, x) <= 1_000);
            prop_assert!(hyperbolic(1_000, 7, x) <= 1_000);
            prop_assert!(piecewise(1_000, &TABLE, x) <= 1_000);
        }
    }
}
