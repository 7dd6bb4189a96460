//! Per-principal stake records and pool totals.
//!
//! Every mutation is split in two:
//! - **plan** (`plan_deposit`, `plan_withdraw`, `plan_emergency_withdraw`):
//!   validates, closes the current accrual window with the old rate snapshot,
//!   and computes the next record, the next total and the receipt. Pure.
//! - **commit**: installs the planned record and total, rejecting a plan
//!   whose record or total has moved since it was made.
//!
//! [`StakingPool`](crate::pool::StakingPool) performs the asset transfer
//! between the two, so a failed transfer leaves the ledger untouched.
//!
//! Not thread-safe; callers serialize access (the pool holds a `Mutex`).

use std::collections::HashMap;
use std::sync::Arc;

use lockpool_core::config::PoolConfig;
use lockpool_core::error::{ConfigError, LedgerError};
use lockpool_core::traits::RateModel;
use lockpool_core::types::{
    DepositReceipt, EmergencyReceipt, PoolSnapshot, PrincipalId, StakeDetails, StakeRecord,
    WithdrawReceipt,
};
use lockpool_rate::DecayingRate;
use tracing::debug;

use crate::accrual;
use crate::lock::{emergency_split, LockGuard};

/// Lifetime counters updated on commit.
#[derive(Debug, Clone, Copy, Default)]
struct Lifetime {
    yield_paid: u128,
    penalties: u128,
    forfeited_yield: u128,
}

/// A committed mutation's effect on the lifetime counters.
pub trait Receipt: Copy {
    /// `(yield_paid, penalty, forfeited_yield)` added on commit.
    fn lifetime_delta(&self) -> (u128, u128, u128) {
        (0, 0, 0)
    }
}

impl Receipt for DepositReceipt {}

impl Receipt for WithdrawReceipt {
    fn lifetime_delta(&self) -> (u128, u128, u128) {
        (self.yield_paid, 0, 0)
    }
}

impl Receipt for EmergencyReceipt {
    fn lifetime_delta(&self) -> (u128, u128, u128) {
        (0, self.penalty as u128, self.forfeited_yield)
    }
}

/// A validated mutation awaiting commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a planned mutation does nothing until committed"]
pub struct Planned<R> {
    principal: PrincipalId,
    before: StakeRecord,
    record: StakeRecord,
    total_before: u128,
    total_locked: u128,
    receipt: R,
}

impl<R: Copy> Planned<R> {
    pub fn principal(&self) -> &PrincipalId {
        &self.principal
    }

    /// Record as it will look after commit.
    pub fn record(&self) -> &StakeRecord {
        &self.record
    }

    /// Total locked as it will be after commit.
    pub fn total_locked(&self) -> u128 {
        self.total_locked
    }

    pub fn receipt(&self) -> R {
        self.receipt
    }
}

/// Owner of all stake records and the pool-wide locked total.
pub struct StakeLedger {
    rate_model: Arc<dyn RateModel>,
    guard: LockGuard,
    penalty_percent: u8,
    records: HashMap<PrincipalId, StakeRecord>,
    total_locked: u128,
    staker_count: u64,
    lifetime: Lifetime,
}

impl StakeLedger {
    /// Create an empty ledger using the production [`DecayingRate`] curve.
    pub fn new(config: &PoolConfig) -> Result<Self, ConfigError> {
        let rate_model = Arc::new(DecayingRate::from_config(config)?);
        Self::with_rate_model(config, rate_model)
    }

    /// Create an empty ledger with a caller-supplied rate model.
    pub fn with_rate_model(
        config: &PoolConfig,
        rate_model: Arc<dyn RateModel>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rate_model,
            guard: LockGuard::new(config.min_lock_secs),
            penalty_percent: config.emergency_penalty_percent,
            records: HashMap::new(),
            total_locked: 0,
            staker_count: 0,
            lifetime: Lifetime::default(),
        })
    }

    // ------------------------------------------------------------------
    // Planning
    // ------------------------------------------------------------------

    fn current(&self, principal: &PrincipalId) -> StakeRecord {
        self.records.get(principal).copied().unwrap_or_default()
    }

    fn plan<R>(&self, principal: &PrincipalId, record: StakeRecord, total_locked: u128, receipt: R) -> Planned<R> {
        Planned {
            principal: *principal,
            before: self.current(principal),
            record,
            total_before: self.total_locked,
            total_locked,
            receipt,
        }
    }

    /// Validate a deposit of `amount` at `now`.
    ///
    /// Closes the open window at the old snapshot, adds `amount` to the
    /// principal and the total, snapshots the post-deposit rate, and restarts
    /// both the accrual window and the lock timer at `now`.
    pub fn plan_deposit(
        &self,
        principal: &PrincipalId,
        amount: u64,
        now: u64,
    ) -> Result<Planned<DepositReceipt>, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let closed = accrual::close_window(&self.current(principal), now)?;
        let new_principal = closed
            .principal
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let total = self
            .total_locked
            .checked_add(amount as u128)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let rate = self.rate_model.rate(total);
        let record = StakeRecord {
            principal: new_principal,
            lock_anchor: now,
            ..accrual::open_window(closed, rate, now)
        };
        debug!(principal = %principal.short(), amount, carry = record.accrued_carry, rate, "planned deposit");
        Ok(self.plan(
            principal,
            record,
            total,
            DepositReceipt {
                principal: new_principal,
                total_locked: total,
                rate_snapshot: rate,
            },
        ))
    }

    /// Validate an ordinary withdrawal of `amount` at `now`.
    ///
    /// Requires the lock to have elapsed. The payout is `amount` plus all
    /// accrued yield up to `now`; the carry resets to zero.
    pub fn plan_withdraw(
        &self,
        principal: &PrincipalId,
        amount: u64,
        now: u64,
    ) -> Result<Planned<WithdrawReceipt>, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let current = self.current(principal);
        if current.is_active() {
            self.guard.check(&current, now)?;
        }
        if amount > current.principal {
            return Err(LedgerError::InsufficientPrincipal {
                requested: amount,
                available: current.principal,
            });
        }
        let closed = accrual::close_window(&current, now)?;
        let yield_paid = closed.accrued_carry;
        let payout = (amount as u128)
            .checked_add(yield_paid)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let remaining = closed.principal - amount;
        let total = self.total_locked - amount as u128;
        let rate = self.rate_model.rate(total);
        let record = StakeRecord {
            principal: remaining,
            accrued_carry: 0,
            ..accrual::open_window(closed, rate, now)
        };
        debug!(principal = %principal.short(), amount, yield_paid, rate, "planned withdrawal");
        Ok(self.plan(
            principal,
            record,
            total,
            WithdrawReceipt {
                principal_returned: amount,
                yield_paid,
                payout,
                remaining_principal: remaining,
            },
        ))
    }

    /// Validate an emergency exit at `now`.
    ///
    /// Ignores the lock. Returns the principal less the configured penalty and
    /// forfeits every unit of yield, both carried and from the open window.
    pub fn plan_emergency_withdraw(
        &self,
        principal: &PrincipalId,
        now: u64,
    ) -> Result<Planned<EmergencyReceipt>, LedgerError> {
        let current = self.current(principal);
        if !current.is_active() {
            return Err(LedgerError::NothingStaked);
        }
        // Informational only: an exit must not fail on the forfeited figure.
        let forfeited_yield = accrual::pending_yield(&current, now).unwrap_or(u128::MAX);
        let (returned, penalty) = emergency_split(current.principal, self.penalty_percent);
        let total = self.total_locked - current.principal as u128;
        let rate = self.rate_model.rate(total);
        let record = StakeRecord {
            principal: 0,
            accrued_carry: 0,
            ..accrual::open_window(current, rate, now)
        };
        debug!(principal = %principal.short(), returned, penalty, forfeited_yield, "planned emergency exit");
        Ok(self.plan(
            principal,
            record,
            total,
            EmergencyReceipt {
                returned,
                penalty,
                forfeited_yield,
            },
        ))
    }

    /// Install a planned mutation and return its receipt.
    ///
    /// Fails with [`LedgerError::StalePlan`] and changes nothing if the
    /// principal's record or the locked total moved after planning.
    pub fn commit<R: Receipt>(&mut self, planned: Planned<R>) -> Result<R, LedgerError> {
        if self.total_locked != planned.total_before || self.current(&planned.principal) != planned.before {
            return Err(LedgerError::StalePlan);
        }

        match (planned.before.is_active(), planned.record.is_active()) {
            (false, true) => self.staker_count += 1,
            (true, false) => self.staker_count -= 1,
            _ => {}
        }
        self.records.insert(planned.principal, planned.record);
        self.total_locked = planned.total_locked;
        let (paid, penalty, forfeited) = planned.receipt.lifetime_delta();
        self.lifetime.yield_paid = self.lifetime.yield_paid.saturating_add(paid);
        self.lifetime.penalties = self.lifetime.penalties.saturating_add(penalty);
        self.lifetime.forfeited_yield = self.lifetime.forfeited_yield.saturating_add(forfeited);
        Ok(planned.receipt)
    }

    // ------------------------------------------------------------------
    // Direct mutations (no external transfer)
    // ------------------------------------------------------------------

    pub fn deposit(&mut self, principal: &PrincipalId, amount: u64, now: u64) -> Result<DepositReceipt, LedgerError> {
        let planned = self.plan_deposit(principal, amount, now)?;
        self.commit(planned)
    }

    pub fn withdraw(&mut self, principal: &PrincipalId, amount: u64, now: u64) -> Result<WithdrawReceipt, LedgerError> {
        let planned = self.plan_withdraw(principal, amount, now)?;
        self.commit(planned)
    }

    pub fn emergency_withdraw(&mut self, principal: &PrincipalId, now: u64) -> Result<EmergencyReceipt, LedgerError> {
        let planned = self.plan_emergency_withdraw(principal, now)?;
        self.commit(planned)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn record(&self, principal: &PrincipalId) -> Option<&StakeRecord> {
        self.records.get(principal)
    }

    /// All records, including retained zero-principal ones.
    pub fn records(&self) -> impl Iterator<Item = (&PrincipalId, &StakeRecord)> {
        self.records.iter()
    }

    pub fn total_locked(&self) -> u128 {
        self.total_locked
    }

    /// Rate a window opened now would snapshot.
    pub fn current_rate(&self) -> u64 {
        self.rate_model.rate(self.total_locked)
    }

    pub fn rate_model(&self) -> &dyn RateModel {
        self.rate_model.as_ref()
    }

    pub fn lock_guard(&self) -> &LockGuard {
        &self.guard
    }

    pub fn pending_yield(&self, principal: &PrincipalId, now: u64) -> Result<u128, LedgerError> {
        accrual::pending_yield(&self.current(principal), now)
    }

    /// Seconds until ordinary withdrawal is allowed; zero for empty records.
    pub fn time_until_unlock(&self, principal: &PrincipalId, now: u64) -> u64 {
        let record = self.current(principal);
        if !record.is_active() {
            return 0;
        }
        self.guard.time_until_unlock(&record, now)
    }

    /// Whether the principal holds a stake whose lock has elapsed.
    pub fn can_withdraw(&self, principal: &PrincipalId, now: u64) -> bool {
        let record = self.current(principal);
        record.is_active() && self.guard.can_withdraw(&record, now)
    }

    pub fn details(&self, principal: &PrincipalId, now: u64) -> Result<StakeDetails, LedgerError> {
        let record = self.current(principal);
        Ok(StakeDetails {
            principal: record.principal,
            pending_yield: accrual::pending_yield(&record, now)?,
            time_until_unlock: self.time_until_unlock(principal, now),
            can_withdraw: self.can_withdraw(principal, now),
            rate_snapshot: record.rate_snapshot,
        })
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            total_locked: self.total_locked,
            current_rate: self.current_rate(),
            staker_count: self.staker_count,
            total_yield_paid: self.lifetime.yield_paid,
            total_penalties: self.lifetime.penalties,
            total_forfeited_yield: self.lifetime.forfeited_yield,
        }
    }

    /// Verify `sum(principal) == total_locked` and the active-record count.
    pub fn check_invariants(&self) -> Result<(), String> {
        let sum: u128 = self.records.values().map(|r| r.principal as u128).sum();
        if sum != self.total_locked {
            return Err(format!("sum of principal {sum} != total locked {}", self.total_locked));
        }
        let active = self.records.values().filter(|r| r.is_active()).count() as u64;
        if active != self.staker_count {
            return Err(format!("active records {active} != staker count {}", self.staker_count));
        }
        Ok(())
    }
}

impl std::fmt::Debug for StakeLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StakeLedger")
            .field("records", &self.records.len())
            .field("total_locked", &self.total_locked)
            .field("staker_count", &self.staker_count)
            .field("guard", &self.guard)
            .finish()
    }
}
