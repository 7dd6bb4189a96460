//! Trait interfaces for the Lockpool ledger.
//!
//! These traits define the contracts between the ledger and its collaborators:
//! - [`RateModel`]: pool-wide rate curve (lockpool-rate implements)
//! - [`AssetTransfer`]: custody of the fungible asset (external; lockpool-ledger ships an in-memory one)
//! - [`PauseGate`]: administrative pause flag (external)
//! - [`Clock`]: source of `now` in seconds (host environment)

use crate::error::TransferError;
use crate::types::PrincipalId;

/// Pure mapping from total locked value to the pool-wide reward rate.
///
/// Implementations must be non-increasing in `total_locked`, return the
/// initial rate at zero, never go below [`minimum_rate`](Self::minimum_rate),
/// and reach that floor exactly at some finite `total_locked`.
pub trait RateModel: Send + Sync {
    /// Reward rate in basis points per year for the given total locked value.
    fn rate(&self, total_locked: u128) -> u64;

    /// Rate at zero total locked.
    fn initial_rate(&self) -> u64;

    /// Floor of the curve.
    fn minimum_rate(&self) -> u64;

    /// Smallest `total_locked` at which [`rate`](Self::rate) equals the floor.
    ///
    /// Default implementation: binary search over the monotone curve.
    /// Returns `None` only if the floor is not reached within `u128`.
    fn floor_threshold(&self) -> Option<u128> {
        let floor = self.minimum_rate();
        if self.rate(u128::MAX) > floor {
            return None;
        }
        let (mut lo, mut hi) = (0u128, u128::MAX);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.rate(mid) <= floor {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Some(lo)
    }
}

/// Custody of the fungible asset backing the pool.
///
/// Each call is atomic: it either fully succeeds or leaves balances untouched.
pub trait AssetTransfer: Send + Sync {
    /// Move `amount` from `from` into the pool.
    fn transfer_in(&self, from: &PrincipalId, amount: u64) -> Result<(), TransferError>;

    /// Move `amount` from the pool to `to`.
    fn transfer_out(&self, to: &PrincipalId, amount: u128) -> Result<(), TransferError>;

    /// Balance currently held by the pool.
    fn pool_balance(&self) -> u128;
}

/// Administrative pause flag. Only deposits consult it.
pub trait PauseGate: Send + Sync {
    fn is_paused(&self) -> bool;
}

/// Monotonic source of the current time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}
