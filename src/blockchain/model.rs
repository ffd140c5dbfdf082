use log::{error, info, warn};
use serde::Serialize;
use std::collections::HashSet;

use super::{Block, BlockData};
use crate::error::{LedgerError, Result};
use crate::transaction::TransactionInput;
use crate::wallet::Wallet;

/// Why `replace_chain` did or did not adopt a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceOutcome {
    Replaced,
    NotLonger,
    InvalidChain,
    InvalidTransactionData,
}

/// Simple in-memory blockchain with Proof-of-Work. Starts at the genesis block
/// and only ever grows, by local mining or by adopting a longer valid chain.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub chain: Vec<Block>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Mine and append a new block with the provided `data`.
    pub fn add_block(&mut self, data: BlockData) -> &Block {
        let block = Block::mine(self.last_block(), data);
        self.chain.push(block);
        self.last_block()
    }

    /// Append a block that was mined against a snapshot of the tip.
    ///
    /// Fails with `StaleTip` if the chain moved on in the meantime (another
    /// local block or an adopted chain); the chain is left untouched.
    pub fn push_mined(&mut self, block: Block) -> Result<&Block> {
        let tip = &self.last_block().hash;
        if block.last_hash != *tip {
            return Err(LedgerError::StaleTip {
                mined_on: block.last_hash,
                tip: tip.clone(),
            });
        }
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Validate a whole chain: fixed genesis, hash linkage, hashes that match
    /// their fields, and difficulty moving by at most one per block.
    pub fn is_valid_chain(chain: &[Block]) -> bool {
        match chain.first() {
            Some(first) if *first == Block::genesis() => {}
            _ => return false,
        }

        for pair in chain.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);

            if current.last_hash != prev.hash {
                return false;
            }

            if current.hash != current.compute_hash() {
                return false;
            }

            if prev.difficulty.abs_diff(current.difficulty) > 1 {
                return false;
            }
        }

        true
    }

    /// Adopt `candidate` if it is strictly longer and valid. `on_success` runs
    /// with the candidate just before the swap.
    pub fn replace_chain<F>(
        &mut self,
        candidate: Vec<Block>,
        validate_transactions: bool,
        on_success: F,
    ) -> ReplaceOutcome
    where
        F: FnOnce(&[Block]),
    {
        if candidate.len() <= self.chain.len() {
            error!(
                "The incoming chain must be longer (incoming={}, local={})",
                candidate.len(),
                self.chain.len()
            );
            return ReplaceOutcome::NotLonger;
        }

        if !Self::is_valid_chain(&candidate) {
            error!("The incoming chain must be valid");
            return ReplaceOutcome::InvalidChain;
        }

        if validate_transactions && !self.valid_transaction_data(&candidate) {
            error!("The incoming chain has invalid transaction data");
            return ReplaceOutcome::InvalidTransactionData;
        }

        on_success(&candidate);
        info!(
            "Replacing chain: {} -> {} blocks",
            self.chain.len(),
            candidate.len()
        );
        self.chain = candidate;
        ReplaceOutcome::Replaced
    }

    /// Check the transactions of every non-genesis block in `candidate`.
    ///
    /// Per block: at most one reward and it pays exactly the mining reward;
    /// every regular transaction is valid and declares the sender's balance
    /// as replayed from *this* chain; no transaction id repeats.
    pub fn valid_transaction_data(&self, candidate: &[Block]) -> bool {
        for (index, block) in candidate.iter().enumerate().skip(1) {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut reward_count = 0;

            for tx in block.transactions() {
                if !seen.insert(tx.id.as_str()) {
                    error!(
                        "Block #{index}: transaction {} appears more than once",
                        tx.id
                    );
                    return false;
                }

                match &tx.input {
                    TransactionInput::Reward => {
                        reward_count += 1;
                        if reward_count > 1 {
                            error!("Block #{index}: miner rewards exceed limit");
                            return false;
                        }
                        if !tx.is_valid() {
                            error!("Block #{index}: miner reward amount is invalid");
                            return false;
                        }
                    }
                    TransactionInput::Regular {
                        amount, address, ..
                    } => {
                        if !tx.is_valid() {
                            error!("Block #{index}: invalid transaction {}", tx.id);
                            return false;
                        }

                        let true_balance = Wallet::calculate_balance(&self.chain, address);
                        if *amount != true_balance {
                            warn!(
                                "Block #{index}: transaction {} declares {amount}, balance is {true_balance}",
                                tx.id
                            );
                            return false;
                        }
                    }
                }
            }
        }

        true
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Difficulty of the current tip.
    pub fn difficulty(&self) -> u32 {
        self.last_block().difficulty
    }
}
