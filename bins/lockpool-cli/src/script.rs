//! Replay of JSON operation scripts against an in-memory pool.
//!
//! A script is a list of steps, each optionally pinned to an absolute time:
//!
//! ```json
//! { "steps": [
//!     { "op": "mint", "account": "alice", "amount": 5000 },
//!     { "at": 0, "op": "deposit", "account": "alice", "amount": 1000 },
//!     { "at": 604800, "op": "withdraw", "account": "alice", "amount": 1000 }
//! ] }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use lockpool_core::config::PoolConfig;
use lockpool_core::error::LedgerError;
use lockpool_core::traits::AssetTransfer;
use lockpool_core::types::{
    DepositReceipt, EmergencyReceipt, PoolSnapshot, PrincipalId, StakeDetails, StakeRecord,
    WithdrawReceipt,
};
use lockpool_ledger::{ManualClock, MemoryAsset, PauseSwitch, StakingPool};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Clock value before the first step.
    #[serde(default)]
    pub start: u64,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Absolute time to set before running the step; the clock stays put when omitted.
    #[serde(default)]
    pub at: Option<u64>,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    /// Credit an account outside the pool.
    Mint { account: String, amount: u64 },
    Deposit { account: String, amount: u64 },
    Withdraw { account: String, amount: u64 },
    Emergency { account: String },
    Fund { account: String, amount: u64 },
    Pause,
    Unpause,
    /// Remove custodied funds behind the ledger's back.
    Drain { account: String, amount: u64 },
    Details { account: String },
    Surplus,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Mint { .. } => "mint",
            Action::Deposit { .. } => "deposit",
            Action::Withdraw { .. } => "withdraw",
            Action::Emergency { .. } => "emergency",
            Action::Fund { .. } => "fund",
            Action::Pause => "pause",
            Action::Unpause => "unpause",
            Action::Drain { .. } => "drain",
            Action::Details { .. } => "details",
            Action::Surplus => "surplus",
        }
    }
}

/// Successful step result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StepValue {
    Deposit(DepositReceipt),
    Withdraw(WithdrawReceipt),
    Emergency(EmergencyReceipt),
    Details(StakeDetails),
    Amount(u128),
    Done,
}

/// One output line per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub at: u64,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<StepValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedRecord {
    pub id: String,
    pub name: Option<String>,
    pub record: StakeRecord,
}

/// Final pool state written by `--dump`.
#[derive(Debug, Clone, Serialize)]
pub struct Dump {
    pub snapshot: PoolSnapshot,
    pub held: u128,
    pub records: Vec<NamedRecord>,
}

/// In-memory pool with a manual clock, driven step by step.
pub struct Simulator {
    pool: StakingPool,
    asset: Arc<MemoryAsset>,
    pause: Arc<PauseSwitch>,
    clock: Arc<ManualClock>,
    names: BTreeMap<PrincipalId, String>,
}

impl Simulator {
    pub fn new(config: &PoolConfig, start: u64) -> Result<Self> {
        let asset = Arc::new(MemoryAsset::new());
        let pause = Arc::new(PauseSwitch::new());
        let clock = Arc::new(ManualClock::new(start));
        let pool = StakingPool::new(config, asset.clone(), pause.clone(), clock.clone())
            .context("Failed to build pool")?;
        Ok(Self {
            pool,
            asset,
            pause,
            clock,
            names: BTreeMap::new(),
        })
    }

    fn id(&mut self, account: &str) -> PrincipalId {
        let id = PrincipalId::from_name(account);
        self.names.entry(id).or_insert_with(|| account.to_string());
        id
    }

    /// Run one step. Operation failures are reported in the outcome, not as errors.
    pub fn step(&mut self, step: &Step) -> Outcome {
        if let Some(at) = step.at {
            self.clock.set(at);
        }
        let at = self.pool.now();
        let (account, result) = self.apply(&step.action);
        debug!(at, op = step.action.name(), ok = result.is_ok(), "script step");
        let (ok, error) = match result {
            Ok(value) => (Some(value), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Outcome {
            at,
            op: step.action.name(),
            account,
            ok,
            error,
        }
    }

    fn apply(&mut self, action: &Action) -> (Option<String>, Result<StepValue, LedgerError>) {
        let account = match action {
            Action::Mint { account, .. }
            | Action::Deposit { account, .. }
            | Action::Withdraw { account, .. }
            | Action::Emergency { account }
            | Action::Fund { account, .. }
            | Action::Drain { account, .. }
            | Action::Details { account } => Some(account.clone()),
            Action::Pause | Action::Unpause | Action::Surplus => None,
        };
        let id = account.as_deref().map(|a| self.id(a)).unwrap_or_default();

        let result = match *action {
            Action::Mint { amount, .. } => {
                self.asset.mint(&id, u128::from(amount));
                Ok(StepValue::Amount(self.asset.balance_of(&id)))
            }
            Action::Deposit { amount, .. } => self.pool.deposit(&id, amount).map(StepValue::Deposit),
            Action::Withdraw { amount, .. } => self.pool.withdraw(&id, amount).map(StepValue::Withdraw),
            Action::Emergency { .. } => self.pool.emergency_withdraw(&id).map(StepValue::Emergency),
            Action::Fund { amount, .. } => self
                .pool
                .fund_rewards(&id, amount)
                .and_then(|()| self.pool.surplus_yield())
                .map(StepValue::Amount),
            Action::Pause => {
                self.pause.pause();
                Ok(StepValue::Done)
            }
            Action::Unpause => {
                self.pause.unpause();
                Ok(StepValue::Done)
            }
            Action::Drain { amount, .. } => self
                .asset
                .drain_pool(&id, u128::from(amount))
                .map(|()| StepValue::Amount(self.asset.pool_balance()))
                .map_err(LedgerError::from),
            Action::Details { .. } => self.pool.details(&id).map(StepValue::Details),
            Action::Surplus => self.pool.surplus_yield().map(StepValue::Amount),
        };
        (account, result)
    }

    /// Run every step in order.
    pub fn run(&mut self, script: &Script) -> Vec<Outcome> {
        script.steps.iter().map(|s| self.step(s)).collect()
    }

    pub fn pool(&self) -> &StakingPool {
        &self.pool
    }

    pub fn dump(&self) -> Dump {
        let records = self
            .pool
            .records()
            .into_iter()
            .map(|(id, record)| NamedRecord {
                id: id.to_string(),
                name: self.names.get(&id).cloned(),
                record,
            })
            .collect();
        Dump {
            snapshot: self.pool.snapshot(),
            held: self.asset.pool_balance(),
            records,
        }
    }
}

pub fn parse_script(raw: &str) -> Result<Script> {
    serde_json::from_str(raw).context("Failed to parse script")
}
