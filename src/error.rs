use thiserror::Error;

/// Hard failures handed back to the caller. Validation problems on incoming
/// chains or pooled transactions are logged and rejected instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount {amount} exceeds balance {balance}")]
    InsufficientFunds { amount: u64, balance: u64 },

    #[error("reward transactions cannot be updated")]
    RewardNotUpdatable,

    #[error("mining aborted after {attempts} attempts")]
    MiningAborted { attempts: u64 },

    #[error("block was mined on {mined_on} but the tip is now {tip}")]
    StaleTip { mined_on: String, tip: String },

    #[error("crypto error: {0}")]
    Crypto(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
