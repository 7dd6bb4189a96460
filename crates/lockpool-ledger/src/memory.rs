//! In-memory collaborators: asset custody, pause switch and clocks.
//!
//! Used by the simulator and tests. [`SystemClock`] is usable in production.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use lockpool_core::error::TransferError;
use lockpool_core::traits::{AssetTransfer, Clock, PauseGate};
use lockpool_core::types::PrincipalId;
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct Balances {
    accounts: HashMap<PrincipalId, u128>,
    pool: u128,
}

/// Fungible asset with per-account balances and a single pool custody account.
///
/// Transfers are all-or-nothing: a failing transfer changes no balance.
#[derive(Debug, Default)]
pub struct MemoryAsset {
    balances: Mutex<Balances>,
    rejecting: AtomicBool,
}

impl MemoryAsset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to an account out of thin air.
    pub fn mint(&self, to: &PrincipalId, amount: u128) {
        let mut b = self.balances.lock();
        let entry = b.accounts.entry(*to).or_default();
        *entry = entry.saturating_add(amount);
    }

    pub fn balance_of(&self, account: &PrincipalId) -> u128 {
        self.balances.lock().accounts.get(account).copied().unwrap_or(0)
    }

    /// Move custodied units out of the pool without touching the ledger.
    ///
    /// Models an external loss so solvency failures can be exercised.
    pub fn drain_pool(&self, to: &PrincipalId, amount: u128) -> Result<(), TransferError> {
        let mut b = self.balances.lock();
        if b.pool < amount {
            return Err(TransferError::InsufficientBalance {
                account: "pool".into(),
                have: b.pool,
                need: amount,
            });
        }
        b.pool -= amount;
        let entry = b.accounts.entry(*to).or_default();
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    /// Make every subsequent transfer fail with [`TransferError::Rejected`].
    pub fn reject_transfers(&self, reject: bool) {
        self.rejecting.store(reject, Ordering::SeqCst);
    }

    fn check_rejecting(&self) -> Result<(), TransferError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(TransferError::Rejected("transfers disabled".into()));
        }
        Ok(())
    }
}

impl AssetTransfer for MemoryAsset {
    fn transfer_in(&self, from: &PrincipalId, amount: u64) -> Result<(), TransferError> {
        self.check_rejecting()?;
        let amount = u128::from(amount);
        let mut b = self.balances.lock();
        let have = b.accounts.get(from).copied().unwrap_or(0);
        if have < amount {
            return Err(TransferError::InsufficientBalance {
                account: from.short(),
                have,
                need: amount,
            });
        }
        b.accounts.insert(*from, have - amount);
        b.pool = b.pool.saturating_add(amount);
        debug!(from = %from.short(), amount, pool = b.pool, "transfer in");
        Ok(())
    }

    fn transfer_out(&self, to: &PrincipalId, amount: u128) -> Result<(), TransferError> {
        self.check_rejecting()?;
        let mut b = self.balances.lock();
        if b.pool < amount {
            return Err(TransferError::InsufficientBalance {
                account: "pool".into(),
                have: b.pool,
                need: amount,
            });
        }
        b.pool -= amount;
        let entry = b.accounts.entry(*to).or_default();
        *entry = entry.saturating_add(amount);
        debug!(to = %to.short(), amount, pool = b.pool, "transfer out");
        Ok(())
    }

    fn pool_balance(&self) -> u128 {
        self.balances.lock().pool
    }
}

/// Administrator-controlled pause flag.
#[derive(Debug, Default)]
pub struct PauseSwitch {
    paused: AtomicBool,
}

impl PauseSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn unpause(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

impl PauseGate for PauseSwitch {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self { now: AtomicU64::new(start) }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| Some(t.saturating_add(secs)))
            .ok();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Wall clock in Unix seconds that never reports an earlier time than it
/// already has.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        let wall = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        let prev = self.last.fetch_max(wall, Ordering::SeqCst);
        prev.max(wall)
    }
}
