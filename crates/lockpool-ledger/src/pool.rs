//! Staking pool service.
//!
//! Wires a [`StakeLedger`] to its collaborators: asset custody, the pause gate
//! and the clock. Every mutation runs under one ledger lock held across plan,
//! transfer and commit, so mutations are fully serialized and a failed
//! transfer leaves the ledger untouched.

use std::sync::Arc;

use lockpool_core::config::PoolConfig;
use lockpool_core::error::{ConfigError, LedgerError};
use lockpool_core::traits::{AssetTransfer, Clock, PauseGate};
use lockpool_core::types::{
    DepositReceipt, EmergencyReceipt, PoolSnapshot, PrincipalId, StakeDetails, StakeRecord,
    WithdrawReceipt,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::ledger::StakeLedger;
use crate::solvency;

/// The custodial pool: ledger plus collaborators.
pub struct StakingPool {
    /// Ledger behind the single writer lock.
    ledger: Mutex<StakeLedger>,
    transfer: Arc<dyn AssetTransfer>,
    pause: Arc<dyn PauseGate>,
    clock: Arc<dyn Clock>,
}

impl StakingPool {
    /// Build a pool with an empty ledger for `config`.
    pub fn new(
        config: &PoolConfig,
        transfer: Arc<dyn AssetTransfer>,
        pause: Arc<dyn PauseGate>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let ledger = StakeLedger::new(config)?;
        info!(
            initial_rate_bps = config.initial_rate_bps,
            minimum_rate_bps = config.minimum_rate_bps,
            min_lock_secs = config.min_lock_secs,
            penalty_percent = config.emergency_penalty_percent,
            "staking pool created"
        );
        Ok(Self::with_ledger(ledger, transfer, pause, clock))
    }

    /// Build a pool around an existing ledger.
    pub fn with_ledger(
        ledger: StakeLedger,
        transfer: Arc<dyn AssetTransfer>,
        pause: Arc<dyn PauseGate>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            transfer,
            pause,
            clock,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Lock `amount` for `principal`. Rejected while paused.
    pub fn deposit(&self, principal: &PrincipalId, amount: u64) -> Result<DepositReceipt, LedgerError> {
        self.deposit_locked(principal, amount)
            .inspect(|r| {
                info!(
                    principal = %principal.short(),
                    amount,
                    rate_bps = r.rate_snapshot,
                    total_locked = r.total_locked,
                    "deposit accepted"
                )
            })
            .inspect_err(|e| warn!(principal = %principal.short(), amount, error = %e, "deposit rejected"))
    }

    fn deposit_locked(&self, principal: &PrincipalId, amount: u64) -> Result<DepositReceipt, LedgerError> {
        let mut ledger = self.ledger.lock();
        if self.pause.is_paused() {
            return Err(LedgerError::Paused);
        }
        let planned = ledger.plan_deposit(principal, amount, self.clock.now())?;
        self.transfer.transfer_in(principal, amount)?;
        ledger.commit(planned)
    }

    /// Return `amount` of principal plus all accrued yield once the lock has
    /// elapsed. Available while paused.
    pub fn withdraw(&self, principal: &PrincipalId, amount: u64) -> Result<WithdrawReceipt, LedgerError> {
        self.withdraw_locked(principal, amount)
            .inspect(|r| {
                info!(
                    principal = %principal.short(),
                    amount,
                    yield_paid = r.yield_paid,
                    payout = r.payout,
                    "withdrawal accepted"
                )
            })
            .inspect_err(|e| warn!(principal = %principal.short(), amount, error = %e, "withdrawal rejected"))
    }

    fn withdraw_locked(&self, principal: &PrincipalId, amount: u64) -> Result<WithdrawReceipt, LedgerError> {
        let mut ledger = self.ledger.lock();
        let planned = ledger.plan_withdraw(principal, amount, self.clock.now())?;
        let receipt = planned.receipt();
        solvency::check_reserve(receipt.yield_paid, self.transfer.pool_balance(), ledger.total_locked())?;
        self.transfer.transfer_out(principal, receipt.payout)?;
        ledger.commit(planned)
    }

    /// Exit immediately, paying the penalty and forfeiting all yield.
    /// Available while paused and during the lock.
    pub fn emergency_withdraw(&self, principal: &PrincipalId) -> Result<EmergencyReceipt, LedgerError> {
        self.emergency_locked(principal)
            .inspect(|r| {
                info!(
                    principal = %principal.short(),
                    returned = r.returned,
                    penalty = r.penalty,
                    forfeited_yield = r.forfeited_yield,
                    "emergency exit"
                )
            })
            .inspect_err(|e| warn!(principal = %principal.short(), error = %e, "emergency exit rejected"))
    }

    fn emergency_locked(&self, principal: &PrincipalId) -> Result<EmergencyReceipt, LedgerError> {
        let mut ledger = self.ledger.lock();
        let planned = ledger.plan_emergency_withdraw(principal, self.clock.now())?;
        self.transfer.transfer_out(principal, u128::from(planned.receipt().returned))?;
        ledger.commit(planned)
    }

    /// Add `amount` to the reward reserve without creating principal.
    pub fn fund_rewards(&self, from: &PrincipalId, amount: u64) -> Result<(), LedgerError> {
        let result = {
            let _ledger = self.ledger.lock();
            if self.pause.is_paused() {
                Err(LedgerError::Paused)
            } else if amount == 0 {
                Err(LedgerError::InvalidAmount)
            } else {
                self.transfer.transfer_in(from, amount).map_err(LedgerError::from)
            }
        };
        result
            .inspect(|_| info!(from = %from.short(), amount, "reward reserve funded"))
            .inspect_err(|e| warn!(from = %from.short(), amount, error = %e, "funding rejected"))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn pending_yield(&self, principal: &PrincipalId) -> Result<u128, LedgerError> {
        self.ledger.lock().pending_yield(principal, self.clock.now())
    }

    pub fn time_until_unlock(&self, principal: &PrincipalId) -> u64 {
        self.ledger.lock().time_until_unlock(principal, self.clock.now())
    }

    pub fn can_withdraw(&self, principal: &PrincipalId) -> bool {
        self.ledger.lock().can_withdraw(principal, self.clock.now())
    }

    pub fn current_rate(&self) -> u64 {
        self.ledger.lock().current_rate()
    }

    pub fn total_locked(&self) -> u128 {
        self.ledger.lock().total_locked()
    }

    /// Held balance in excess of locked principal.
    pub fn surplus_yield(&self) -> Result<u128, LedgerError> {
        let ledger = self.ledger.lock();
        let held = self.transfer.pool_balance();
        let surplus = solvency::surplus_yield(held, ledger.total_locked())?;
        debug!(held, surplus, "surplus yield");
        Ok(surplus)
    }

    pub fn details(&self, principal: &PrincipalId) -> Result<StakeDetails, LedgerError> {
        self.ledger.lock().details(principal, self.clock.now())
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.ledger.lock().snapshot()
    }

    pub fn record(&self, principal: &PrincipalId) -> Option<StakeRecord> {
        self.ledger.lock().record(principal).copied()
    }

    /// All records sorted by principal id.
    pub fn records(&self) -> Vec<(PrincipalId, StakeRecord)> {
        let mut out: Vec<_> = self.ledger.lock().records().map(|(id, r)| (*id, *r)).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Ledger bookkeeping only: `sum(principal) == total_locked` and the
    /// staker count. Holds even when custody has been drained externally.
    pub fn check_bookkeeping(&self) -> Result<(), String> {
        self.ledger.lock().check_invariants()
    }

    /// Ledger bookkeeping invariants plus `held >= locked`.
    pub fn check_invariants(&self) -> Result<(), String> {
        let ledger = self.ledger.lock();
        ledger.check_invariants()?;
        let held = self.transfer.pool_balance();
        if held < ledger.total_locked() {
            return Err(format!("held {held} below total locked {}", ledger.total_locked()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for StakingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StakingPool").field("ledger", &*self.ledger.lock()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ManualClock, MemoryAsset, PauseSwitch};
    use lockpool_core::constants::{DEFAULT_MIN_LOCK_SECS, SECONDS_PER_YEAR};
    use lockpool_core::error::TransferError;

    const LOCK: u64 = DEFAULT_MIN_LOCK_SECS;

    struct Harness {
        pool: StakingPool,
        asset: Arc<MemoryAsset>,
        pause: Arc<PauseSwitch>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let asset = Arc::new(MemoryAsset::new());
        let pause = Arc::new(PauseSwitch::new());
        let clock = Arc::new(ManualClock::new(0));
        let pool = StakingPool::new(
            &PoolConfig::default(),
            asset.clone(),
            pause.clone(),
            clock.clone(),
        )
        .unwrap();
        Harness { pool, asset, pause, clock }
    }

    fn alice() -> PrincipalId {
        PrincipalId::from_name("alice")
    }

    fn treasury() -> PrincipalId {
        PrincipalId::from_name("treasury")
    }

    #[test]
    fn deposit_moves_funds_and_records() {
        let h = harness();
        h.asset.mint(&alice(), 5_000);
        let r = h.pool.deposit(&alice(), 1_000).unwrap();
        assert_eq!(r.rate_snapshot, 990);
        assert_eq!(h.asset.balance_of(&alice()), 4_000);
        assert_eq!(h.asset.pool_balance(), 1_000);
        assert_eq!(h.pool.total_locked(), 1_000);
        h.pool.check_invariants().unwrap();
    }

    #[test]
    fn failed_transfer_in_leaves_ledger_untouched() {
        let h = harness();
        h.asset.mint(&alice(), 10);
        let err = h.pool.deposit(&alice(), 11).unwrap_err();
        assert!(matches!(err, LedgerError::Transfer(TransferError::InsufficientBalance { .. })));
        assert!(h.pool.record(&alice()).is_none());
        assert_eq!(h.pool.total_locked(), 0);
    }

    #[test]
    fn paused_pool_rejects_deposit_only() {
        let h = harness();
        h.asset.mint(&alice(), 2_000);
        h.pool.deposit(&alice(), 1_000).unwrap();
        h.pool.fund_rewards(&alice(), 100).unwrap();
        h.pause.pause();

        assert_eq!(h.pool.deposit(&alice(), 1), Err(LedgerError::Paused));
        assert_eq!(h.pool.fund_rewards(&alice(), 1), Err(LedgerError::Paused));

        h.clock.set(LOCK);
        h.pool.withdraw(&alice(), 500).unwrap();
        h.pool.emergency_withdraw(&alice()).unwrap();
        assert_eq!(h.pool.total_locked(), 0);
    }

    #[test]
    fn withdraw_pays_yield_from_reserve() {
        let h = harness();
        h.asset.mint(&alice(), 10_000_000);
        h.asset.mint(&treasury(), 1_000_000);
        h.pool.deposit(&alice(), 10_000_000).unwrap();
        h.pool.fund_rewards(&treasury(), 1_000_000).unwrap();
        assert_eq!(h.pool.surplus_yield().unwrap(), 1_000_000);

        h.clock.set(SECONDS_PER_YEAR);
        let pending = h.pool.pending_yield(&alice()).unwrap();
        // 10M at the 10 bps floor for a year.
        assert_eq!(pending, 10_000);

        let r = h.pool.withdraw(&alice(), 10_000_000).unwrap();
        assert_eq!(r.payout, 10_010_000);
        assert_eq!(h.asset.balance_of(&alice()), 10_010_000);
        assert_eq!(h.pool.surplus_yield().unwrap(), 990_000);
        assert_eq!(h.pool.snapshot().total_yield_paid, 10_000);
        h.pool.check_invariants().unwrap();
    }

    #[test]
    fn withdraw_without_reserve_is_rejected() {
        let h = harness();
        h.asset.mint(&alice(), 10_000_000);
        h.pool.deposit(&alice(), 10_000_000).unwrap();
        h.clock.set(SECONDS_PER_YEAR);

        let err = h.pool.withdraw(&alice(), 10_000_000).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientRewardReserve { needed: 10_000, available: 0 });
        assert_eq!(h.pool.total_locked(), 10_000_000);
        assert_eq!(h.asset.pool_balance(), 10_000_000);

        // Emergency exit never depends on the reserve.
        let r = h.pool.emergency_withdraw(&alice()).unwrap();
        assert_eq!(r.returned, 9_000_000);
        assert_eq!(r.forfeited_yield, 10_000);
        assert_eq!(h.pool.surplus_yield().unwrap(), 1_000_000);
    }

    #[test]
    fn failed_transfer_out_leaves_ledger_untouched() {
        let h = harness();
        h.asset.mint(&alice(), 1_100);
        h.pool.deposit(&alice(), 1_000).unwrap();
        h.pool.fund_rewards(&alice(), 100).unwrap();
        let before = h.pool.record(&alice()).unwrap();
        h.clock.set(LOCK);
        h.asset.reject_transfers(true);

        assert!(matches!(h.pool.withdraw(&alice(), 1_000), Err(LedgerError::Transfer(_))));
        assert!(matches!(h.pool.emergency_withdraw(&alice()), Err(LedgerError::Transfer(_))));
        assert_eq!(h.pool.record(&alice()).unwrap(), before);
        assert_eq!(h.pool.total_locked(), 1_000);
    }

    #[test]
    fn drained_pool_reports_solvency_violation() {
        let h = harness();
        h.asset.mint(&alice(), 1_000);
        h.asset.mint(&treasury(), 50);
        h.pool.deposit(&alice(), 1_000).unwrap();
        h.pool.fund_rewards(&treasury(), 50).unwrap();
        assert_eq!(h.pool.surplus_yield().unwrap(), 50);

        h.asset.drain_pool(&treasury(), 51).unwrap();
        assert_eq!(
            h.pool.surplus_yield(),
            Err(LedgerError::SolvencyViolation { held: 999, locked: 1_000 })
        );
        assert!(h.pool.check_invariants().is_err());
        h.pool.check_bookkeeping().unwrap();
    }

    #[test]
    fn fund_rewards_rejects_zero() {
        let h = harness();
        assert_eq!(h.pool.fund_rewards(&treasury(), 0), Err(LedgerError::InvalidAmount));
    }

    #[test]
    fn queries_follow_clock() {
        let h = harness();
        h.asset.mint(&alice(), 100);
        h.pool.deposit(&alice(), 100).unwrap();
        assert_eq!(h.pool.time_until_unlock(&alice()), LOCK);
        assert!(!h.pool.can_withdraw(&alice()));
        h.clock.advance(LOCK);
        assert_eq!(h.pool.time_until_unlock(&alice()), 0);
        assert!(h.pool.can_withdraw(&alice()));
        let d = h.pool.details(&alice()).unwrap();
        assert!(d.can_withdraw);
        assert_eq!(d.principal, 100);
    }

    #[test]
    fn pool_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StakingPool>();
    }

    #[test]
    fn concurrent_deposits_serialize() {
        let h = harness();
        let ids: Vec<_> = (0..8).map(|i| PrincipalId::from_name(&format!("p{i}"))).collect();
        for id in &ids {
            h.asset.mint(id, 1_000);
        }
        std::thread::scope(|s| {
            for id in &ids {
                let pool = &h.pool;
                s.spawn(move || {
                    for _ in 0..10 {
                        pool.deposit(id, 100).unwrap();
                    }
                });
            }
        });
        assert_eq!(h.pool.total_locked(), 8_000);
        assert_eq!(h.pool.snapshot().staker_count, 8);
        h.pool.check_invariants().unwrap();
    }
}
