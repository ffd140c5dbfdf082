use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::model::Transaction;
use crate::blockchain::Block;

/// Transactions known locally but not yet settled on-chain, keyed by id.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionPool {
    transaction_map: HashMap<String, Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self {
            transaction_map: HashMap::new(),
        }
    }

    /// Insert or replace by id.
    pub fn set_transaction(&mut self, tx: Transaction) {
        self.transaction_map.insert(tx.id.clone(), tx);
    }

    /// Overwrite the whole pool with a snapshot received from a peer.
    pub fn set_map(&mut self, transaction_map: HashMap<String, Transaction>) {
        self.transaction_map = transaction_map;
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transaction_map.get(id)
    }

    /// Pending transaction authored by `address`, if any.
    pub fn existing_transaction(&self, address: &str) -> Option<&Transaction> {
        self.transaction_map
            .values()
            .find(|tx| tx.sender() == Some(address))
    }

    /// Mutable form of [`existing_transaction`](Self::existing_transaction),
    /// used to merge a new transfer into the sender's pending transaction.
    pub fn existing_transaction_mut(&mut self, address: &str) -> Option<&mut Transaction> {
        self.transaction_map
            .values_mut()
            .find(|tx| tx.sender() == Some(address))
    }

    /// The pooled transactions that pass [`Transaction::is_valid`].
    pub fn valid_transactions(&self) -> Vec<Transaction> {
        let valid: Vec<Transaction> = self
            .transaction_map
            .values()
            .filter(|tx| tx.is_valid())
            .cloned()
            .collect();
        let discarded = self.transaction_map.len() - valid.len();
        if discarded > 0 {
            warn!("Transaction pool: skipped {discarded} invalid transaction(s)");
        }
        valid
    }

    pub fn clear(&mut self) {
        self.transaction_map.clear();
    }

    /// Drop the given ids; entries added since the ids were collected stay.
    pub fn remove_transactions<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for id in ids {
            self.transaction_map.remove(id);
        }
    }

    /// Drop every pooled transaction whose id appears anywhere in `chain`.
    pub fn clear_blockchain_transactions(&mut self, chain: &[Block]) {
        let settled: HashSet<&str> = chain
            .iter()
            .flat_map(|block| block.transactions())
            .map(|tx| tx.id.as_str())
            .collect();

        let before = self.transaction_map.len();
        self.transaction_map
            .retain(|id, _| !settled.contains(id.as_str()));
        debug!(
            "Transaction pool cleaned: {} -> {} (removed {})",
            before,
            self.transaction_map.len(),
            before - self.transaction_map.len()
        );
    }

    pub fn transactions(&self) -> &HashMap<String, Transaction> {
        &self.transaction_map
    }

    pub fn len(&self) -> usize {
        self.transaction_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_map.is_empty()
    }
}
