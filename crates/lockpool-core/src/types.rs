//! Core ledger types: principal identities, stake records, query views.
//!
//! Principal amounts are `u64` asset base units. Pool-wide sums and yield
//! amounts are `u128` so that many maximal stakes cannot overflow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a principal: a 32-byte key.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PrincipalId(pub [u8; 32]);

impl PrincipalId {
    /// Create a PrincipalId from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a PrincipalId from a human-readable name (BLAKE3 of the UTF-8 bytes).
    ///
    /// # Examples
    ///
    /// ```
    /// use lockpool_core::types::PrincipalId;
    /// assert_eq!(PrincipalId::from_name("alice"), PrincipalId::from_name("alice"));
    /// assert_ne!(PrincipalId::from_name("alice"), PrincipalId::from_name("bob"));
    /// ```
    pub fn from_name(name: &str) -> Self {
        Self(*blake3::hash(name.as_bytes()).as_bytes())
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; 32]> for PrincipalId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Per-principal stake state.
///
/// Created on first deposit and retained (possibly with zero principal)
/// afterwards. Each mutation closes the current accrual window into
/// `accrued_carry` and opens a new one at `window_start` with a fresh
/// `rate_snapshot`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StakeRecord {
    /// Amount currently locked.
    pub principal: u64,
    /// Start of the current accrual window (seconds).
    pub window_start: u64,
    /// Yield finalized from closed windows, not yet paid out.
    pub accrued_carry: u128,
    /// Pool-wide rate captured at `window_start`, in basis points per year.
    pub rate_snapshot: u64,
    /// Timestamp of the most recent deposit. The lock timer runs from here.
    pub lock_anchor: u64,
}

impl StakeRecord {
    /// Whether the record currently holds any principal.
    pub fn is_active(&self) -> bool {
        self.principal > 0
    }
}

/// Combined read-only view of one principal's stake.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakeDetails {
    pub principal: u64,
    pub pending_yield: u128,
    pub time_until_unlock: u64,
    pub can_withdraw: bool,
    pub rate_snapshot: u64,
}

/// Pool-wide aggregate view.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PoolSnapshot {
    /// Sum of all records' principal.
    pub total_locked: u128,
    /// Rate a deposit opening a window now would snapshot.
    pub current_rate: u64,
    /// Records with non-zero principal.
    pub staker_count: u64,
    /// Lifetime yield paid out by ordinary withdrawals.
    pub total_yield_paid: u128,
    /// Lifetime emergency-exit penalties retained by the pool.
    pub total_penalties: u128,
    /// Lifetime carry and window yield forfeited by emergency exits.
    pub total_forfeited_yield: u128,
}

/// Result of an accepted deposit.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Principal after the deposit.
    pub principal: u64,
    pub total_locked: u128,
    /// Rate snapshotted for the new window.
    pub rate_snapshot: u64,
}

/// Result of an accepted ordinary withdrawal.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub principal_returned: u64,
    pub yield_paid: u128,
    /// `principal_returned + yield_paid`, the amount transferred out.
    pub payout: u128,
    pub remaining_principal: u64,
}

/// Result of an accepted emergency exit.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmergencyReceipt {
    /// Principal transferred back after the penalty.
    pub returned: u64,
    /// Principal retained by the pool.
    pub penalty: u64,
    pub forfeited_yield: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_display_is_hex() {
        let id = PrincipalId([0xAB; 32]);
        assert_eq!(id.to_string(), "ab".repeat(32));
        assert_eq!(id.short(), "abababab");
    }

    #[test]
    fn default_record_is_inactive() {
        let rec = StakeRecord::default();
        assert!(!rec.is_active());
        assert_eq!(rec.accrued_carry, 0);
    }

    #[test]
    fn record_serde_roundtrip() {
        let rec = StakeRecord {
            principal: 1_000,
            window_start: 10,
            accrued_carry: 7,
            rate_snapshot: 990,
            lock_anchor: 10,
        };
        let json = serde_json::to_string(&rec).unwrap();
        let decoded: StakeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, decoded);
    }

    #[test]
    fn from_name_is_deterministic() {
        let a = PrincipalId::from_name("carol");
        assert_eq!(a, PrincipalId::from_name("carol"));
        assert_ne!(a, PrincipalId::default());
    }
}
