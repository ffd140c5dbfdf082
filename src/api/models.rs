use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::blockchain::{Block, BlockData, Blockchain, MineControl, ReplaceOutcome};
use crate::config::Settings;
use crate::error::LedgerError;
use crate::transaction::{Transaction, TransactionPool};
use crate::wallet::Wallet;

/// Shared node state: the chain, the mempool and the node's own wallet.
///
/// Lock order is blockchain, then transaction_pool, then wallet. Mining only
/// locks to snapshot the tip and to commit; the search itself runs unlocked.
pub struct AppState {
    pub blockchain: Mutex<Blockchain>,
    pub transaction_pool: Mutex<TransactionPool>,
    pub wallet: Mutex<Wallet>,
    pub settings: Settings,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            blockchain: Mutex::new(Blockchain::new()),
            transaction_pool: Mutex::new(TransactionPool::new()),
            wallet: Mutex::new(Wallet::new()),
            settings,
        }
    }

    /// Fresh limits for one mining run.
    pub fn mine_control(&self) -> MineControl {
        match self.settings.mine_timeout {
            Some(timeout) => MineControl::within(timeout),
            None => MineControl::unbounded(),
        }
    }
}

/* ---------- Errors ---------- */

#[derive(Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::InsufficientFunds { .. } | LedgerError::RewardNotUpdatable => {
                StatusCode::BAD_REQUEST
            }
            LedgerError::MiningAborted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::StaleTip { .. } => StatusCode::CONFLICT,
            LedgerError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            kind: "error",
            message: self.to_string(),
        })
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

#[derive(Deserialize)]
pub struct MineRequest {
    #[serde(default)]
    pub data: BlockData,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub mined_index: usize,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub transactions: usize,
}

impl MineResponse {
    pub fn new(index: usize, block: &Block) -> Self {
        Self {
            mined_index: index,
            hash: block.hash.clone(),
            nonce: block.nonce,
            difficulty: block.difficulty,
            transactions: block.transactions().len(),
        }
    }
}

#[derive(Serialize)]
pub struct ReplaceResponse {
    pub accepted: bool,
    pub outcome: ReplaceOutcome,
    pub length: usize,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct TransactRequest {
    pub recipient: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct TransactResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub transaction: Transaction,
}

/* ---------- Wallet API Models ---------- */

#[derive(Serialize)]
pub struct WalletInfoResponse {
    pub address: String,
    pub balance: u64,
}

#[derive(Serialize)]
pub struct NewWalletResponse {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub mine_rate_ms: i64,
    pub last_interval_ms: Option<i64>,
    pub avg_interval_ms: Option<f64>,
    pub pool_size: usize,
}
