use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{
    GENESIS_HASH, GENESIS_LAST_HASH, GENESIS_TIMESTAMP, INITIAL_DIFFICULTY, MIN_DIFFICULTY,
    MINE_RATE_MS,
};
use crate::crypto::{count_leading_zero_bits, crypto_hash};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// Payload of a block: a list of transactions, or any other JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockData {
    Transactions(Vec<Transaction>),
    Raw(Value),
}

impl Default for BlockData {
    fn default() -> Self {
        BlockData::Transactions(Vec::new())
    }
}

impl From<Vec<Transaction>> for BlockData {
    fn from(txs: Vec<Transaction>) -> Self {
        BlockData::Transactions(txs)
    }
}

/// A sealed block. `hash` is always the digest of the other five fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub timestamp: i64, // Unix millis (UTC)
    pub last_hash: String,
    pub hash: String,
    pub data: BlockData,
    pub nonce: u64,
    pub difficulty: u32,
}

/// Limits for a proof-of-work search. The default never stops.
#[derive(Debug, Clone, Default)]
pub struct MineControl {
    pub deadline: Option<Instant>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl MineControl {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Give up once `timeout` has elapsed from now.
    pub fn within(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: None,
        }
    }

    /// Also give up as soon as `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn should_stop(&self) -> bool {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Block {
    /// The fixed first block every node agrees on. Its hash is a sentinel,
    /// not a digest.
    pub fn genesis() -> Self {
        Self {
            timestamp: GENESIS_TIMESTAMP,
            last_hash: GENESIS_LAST_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            data: BlockData::default(),
            nonce: 0,
            difficulty: INITIAL_DIFFICULTY,
        }
    }

    /// Digest over a block's fields, order-independent.
    pub fn hash_fields(
        timestamp: i64,
        last_hash: &str,
        data: &BlockData,
        nonce: u64,
        difficulty: u32,
    ) -> String {
        crypto_hash(&[
            &json!(timestamp),
            &json!(last_hash),
            &json!(data),
            &json!(nonce),
            &json!(difficulty),
        ])
    }

    /// Recompute the hash from this block's declared fields.
    pub fn compute_hash(&self) -> String {
        Self::hash_fields(
            self.timestamp,
            &self.last_hash,
            &self.data,
            self.nonce,
            self.difficulty,
        )
    }

    /// Whether the hash has at least `difficulty` leading zero bits.
    pub fn meets_difficulty(&self) -> bool {
        count_leading_zero_bits(&self.hash) >= self.difficulty
    }

    /// Transactions carried by this block; empty for raw payloads.
    pub fn transactions(&self) -> &[Transaction] {
        match &self.data {
            BlockData::Transactions(txs) => txs,
            BlockData::Raw(_) => &[],
        }
    }

    /// Perform Proof-of-Work on top of `last_block` until the hash has at
    /// least `difficulty` leading zero bits. Runs until it succeeds.
    pub fn mine(last_block: &Block, data: BlockData) -> Block {
        let mut search = Search::start(last_block, data);
        while !search.attempt() {}
        search.into_block()
    }

    /// Like [`mine`](Self::mine) but gives up when `control` says so.
    pub fn mine_with(last_block: &Block, data: BlockData, control: &MineControl) -> Result<Block> {
        let mut search = Search::start(last_block, data);
        while !search.attempt() {
            if control.should_stop() {
                return Err(LedgerError::MiningAborted {
                    attempts: search.nonce,
                });
            }
        }
        Ok(search.into_block())
    }

    /// Next difficulty given how long the block after `original` took:
    /// faster than [`MINE_RATE_MS`] raises it by one, otherwise it drops by
    /// one, never below [`MIN_DIFFICULTY`]. Timestamps come from peers, so
    /// the gap saturates instead of overflowing.
    pub fn adjust_difficulty(original: &Block, timestamp: i64) -> u32 {
        if timestamp.saturating_sub(original.timestamp) < MINE_RATE_MS {
            original.difficulty.saturating_add(1).max(MIN_DIFFICULTY)
        } else {
            original.difficulty.saturating_sub(1).max(MIN_DIFFICULTY)
        }
    }
}

/// State of one nonce search. The difficulty is fixed when the search starts;
/// the timestamp is refreshed on every attempt.
struct Search {
    last_hash: String,
    data: BlockData,
    difficulty: u32,
    timestamp: i64,
    nonce: u64,
    hash: String,
}

impl Search {
    fn start(last_block: &Block, data: BlockData) -> Self {
        let timestamp = Utc::now().timestamp_millis();
        Self {
            last_hash: last_block.hash.clone(),
            data,
            difficulty: Block::adjust_difficulty(last_block, timestamp),
            timestamp,
            nonce: 0,
            hash: String::new(),
        }
    }

    /// Hash the current nonce. On a miss, advance to the next one.
    fn attempt(&mut self) -> bool {
        self.timestamp = Utc::now().timestamp_millis();
        self.hash = Block::hash_fields(
            self.timestamp,
            &self.last_hash,
            &self.data,
            self.nonce,
            self.difficulty,
        );
        if count_leading_zero_bits(&self.hash) >= self.difficulty {
            return true;
        }
        self.nonce = self.nonce.wrapping_add(1);
        false
    }

    fn into_block(self) -> Block {
        Block {
            timestamp: self.timestamp,
            last_hash: self.last_hash,
            hash: self.hash,
            data: self.data,
            nonce: self.nonce,
            difficulty: self.difficulty,
        }
    }
}
