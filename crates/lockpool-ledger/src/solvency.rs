//! Solvency checks against the custodied balance.
//!
//! The pool must always hold at least the principal it owes. Anything above
//! that is surplus: the reserve that pays yield.

use lockpool_core::error::LedgerError;
use tracing::warn;

/// `held - locked`, or [`LedgerError::SolvencyViolation`] when the pool holds
/// less than it owes.
pub fn surplus_yield(held: u128, locked: u128) -> Result<u128, LedgerError> {
    held.checked_sub(locked).ok_or_else(|| {
        warn!(held, locked, "pool balance below total locked principal");
        LedgerError::SolvencyViolation { held, locked }
    })
}

/// Verify the surplus can cover `needed` units of yield.
///
/// An insolvent pool has no reserve at all; the violation itself is only
/// reported by [`surplus_yield`].
pub fn check_reserve(needed: u128, held: u128, locked: u128) -> Result<(), LedgerError> {
    if needed == 0 {
        return Ok(());
    }
    let available = held.saturating_sub(locked);
    if needed > available {
        return Err(LedgerError::InsufficientRewardReserve { needed, available });
    }
    Ok(())
}
