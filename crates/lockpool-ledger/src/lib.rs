//! # lockpool-ledger
//! Stake records, yield accrual and the serialized pool service.
//!
//! - [`accrual`]: fixed-point window yield with a 256-bit intermediate
//! - [`lock`]: minimum lock duration and emergency penalty split
//! - [`solvency`]: surplus yield and reward reserve checks
//! - [`ledger::StakeLedger`]: per-principal records and pool totals
//! - [`pool::StakingPool`]: ledger wired to transfer, pause and clock collaborators
//! - [`memory`]: in-memory collaborators for tests and simulation

pub mod accrual;
pub mod ledger;
pub mod lock;
pub mod memory;
pub mod pool;
pub mod solvency;

pub use ledger::{Planned, Receipt, StakeLedger};
pub use memory::{ManualClock, MemoryAsset, PauseSwitch, SystemClock};
pub use pool::StakingPool;
