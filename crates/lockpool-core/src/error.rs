//! Error types for the Lockpool ledger.
use thiserror::Error;

/// Failures reported by the asset transfer collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient balance in {account}: have {have}, need {need}")] InsufficientBalance { account: String, have: u128, need: u128 },
    #[error("transfer rejected: {0}")] Rejected(String),
}

/// Rejections of a [`PoolConfig`](crate::config::PoolConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("minimum rate {minimum} exceeds initial rate {initial}")] MinimumAboveInitial { minimum: u64, initial: u64 },
    #[error("initial rate {0} exceeds maximum {max}", max = crate::constants::MAX_RATE_BPS)] RateTooHigh(u64),
    #[error("emergency penalty {0}% exceeds 100%")] PenaltyOutOfRange(u8),
    #[error("invalid rate curve: {0}")] InvalidCurve(String),
}

/// Ledger operation failures. None of them leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be greater than zero")] InvalidAmount,
    #[error("insufficient principal: requested {requested}, available {available}")] InsufficientPrincipal { requested: u64, available: u64 },
    #[error("lock active: {remaining_secs}s until unlock")] LockActive { remaining_secs: u64 },
    #[error("nothing staked")] NothingStaked,
    #[error("deposits are paused")] Paused,
    #[error("solvency violation: held {held} below locked {locked}")] SolvencyViolation { held: u128, locked: u128 },
    #[error("insufficient reward reserve: need {needed}, available {available}")] InsufficientRewardReserve { needed: u128, available: u128 },
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("stale plan: ledger changed since the mutation was planned")] StalePlan,
    #[error(transparent)] Transfer(#[from] TransferError),
}
