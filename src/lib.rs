//! In-memory proof-of-work ledger: hash-linked blocks with adaptive
//! difficulty, signed output-map transactions, a mempool and balances
//! replayed from the chain, served over actix-web.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod miner;
pub mod transaction;
pub mod wallet;
