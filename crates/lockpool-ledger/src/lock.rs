//! Minimum lock duration and the emergency exit penalty.

use lockpool_core::constants::PERCENT_DENOMINATOR;
use lockpool_core::error::LedgerError;
use lockpool_core::types::StakeRecord;

/// Enforces the minimum lock duration for ordinary withdrawals.
///
/// The timer runs from the record's `lock_anchor`, which every deposit
/// (including top-ups) resets for the whole balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockGuard {
    min_lock_secs: u64,
}

impl LockGuard {
    pub fn new(min_lock_secs: u64) -> Self {
        Self { min_lock_secs }
    }

    pub fn min_lock_secs(&self) -> u64 {
        self.min_lock_secs
    }

    /// Earliest time an ordinary withdrawal is allowed.
    pub fn unlock_at(&self, record: &StakeRecord) -> u64 {
        record.lock_anchor.saturating_add(self.min_lock_secs)
    }

    pub fn time_until_unlock(&self, record: &StakeRecord, now: u64) -> u64 {
        self.unlock_at(record).saturating_sub(now)
    }

    pub fn can_withdraw(&self, record: &StakeRecord, now: u64) -> bool {
        now >= self.unlock_at(record)
    }

    /// `Ok` once the lock has elapsed, [`LedgerError::LockActive`] before.
    pub fn check(&self, record: &StakeRecord, now: u64) -> Result<(), LedgerError> {
        match self.time_until_unlock(record, now) {
            0 => Ok(()),
            remaining_secs => Err(LedgerError::LockActive { remaining_secs }),
        }
    }
}

/// Split a principal into `(returned, penalty)` for an emergency exit.
///
/// `returned = floor(principal * (100 - penalty_percent) / 100)`; the
/// truncation remainder lands in the penalty, so the principal never gets more
/// than the exact entitlement. Percentages above 100 are treated as 100.
pub fn emergency_split(principal: u64, penalty_percent: u8) -> (u64, u64) {
    let keep = PERCENT_DENOMINATOR.saturating_sub(u64::from(penalty_percent)) as u128;
    let returned = (principal as u128 * keep / PERCENT_DENOMINATOR as u128) as u64;
    (returned, principal - returned)
}
