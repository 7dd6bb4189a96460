//! Shared fixtures for the integration tests.

use std::sync::Arc;

use lockpool_core::config::PoolConfig;
use lockpool_core::types::PrincipalId;
use lockpool_ledger::{ManualClock, MemoryAsset, PauseSwitch, StakingPool};

/// A pool wired to in-memory collaborators the test can poke directly.
pub struct TestPool {
    pub pool: StakingPool,
    pub asset: Arc<MemoryAsset>,
    pub pause: Arc<PauseSwitch>,
    pub clock: Arc<ManualClock>,
}

impl TestPool {
    /// Default configuration, clock at `start`.
    pub fn new(start: u64) -> Self {
        Self::with_config(&PoolConfig::default(), start)
    }

    pub fn with_config(config: &PoolConfig, start: u64) -> Self {
        let asset = Arc::new(MemoryAsset::new());
        let pause = Arc::new(PauseSwitch::new());
        let clock = Arc::new(ManualClock::new(start));
        let pool = StakingPool::new(config, asset.clone(), pause.clone(), clock.clone())
            .expect("test config must be valid");
        Self { pool, asset, pause, clock }
    }

    /// Mint `amount` to `who` and deposit it.
    pub fn fund_and_deposit(&self, who: &PrincipalId, amount: u64) {
        self.asset.mint(who, u128::from(amount));
        self.pool.deposit(who, amount).expect("deposit");
    }

    /// Mint `amount` to a treasury account and add it to the reward reserve.
    pub fn seed_reserve(&self, amount: u64) {
        let treasury = PrincipalId::from_name("treasury");
        self.asset.mint(&treasury, u128::from(amount));
        self.pool.fund_rewards(&treasury, amount).expect("fund rewards");
    }
}

/// Deterministic principal id for a small index.
pub fn principal(n: u8) -> PrincipalId {
    PrincipalId::from_name(&format!("principal-{n}"))
}
