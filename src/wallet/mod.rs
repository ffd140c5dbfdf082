use secp256k1::{PublicKey, SecretKey};
use serde::Serialize;

use crate::blockchain::{Block, STARTING_BALANCE};
use crate::crypto::{generate_keypair, public_key_hex, sign};
use crate::error::Result;
use crate::transaction::Transaction;

/// A secp256k1 keypair plus a cached balance.
///
/// The address is the hex of the compressed public key. The cached balance is
/// refreshed from the chain whenever one is supplied.
#[derive(Debug, Clone)]
pub struct Wallet {
    secret_key: SecretKey,
    pub key: PublicKey,
    pub public_key: String,
    pub balance: u64,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet {
    pub fn new() -> Self {
        let (secret_key, key) = generate_keypair();
        Self {
            secret_key,
            public_key: public_key_hex(&key),
            key,
            balance: STARTING_BALANCE,
        }
    }

    /// Hex of the secret key. Only handed out once, when a wallet is created
    /// on behalf of a client.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Sign the canonical digest of `data`.
    pub fn sign<T: Serialize>(&self, data: &T) -> Result<String> {
        sign(&self.secret_key, data)
    }

    /// Author a transfer. With a chain, the cached balance is replayed first.
    pub fn create_transaction(
        &mut self,
        recipient: &str,
        amount: u64,
        chain: Option<&[Block]>,
    ) -> Result<Transaction> {
        if let Some(chain) = chain {
            self.balance = Self::calculate_balance(chain, &self.public_key);
        }
        Transaction::new(self, recipient, amount)
    }

    /// Replay `chain` from the tail backwards to find what `address` can spend.
    ///
    /// Every output paid to `address` is summed, block by block, until a block
    /// in which `address` itself sent a transaction; that block is still
    /// counted (it holds the sender's change) and the scan stops there. If the
    /// address never sent anything the starting balance is added on top.
    pub fn calculate_balance(chain: &[Block], address: &str) -> u64 {
        let mut has_conducted_transaction = false;
        let mut outputs_total: u64 = 0;

        for block in chain.iter().skip(1).rev() {
            for tx in block.transactions() {
                if tx.sender() == Some(address) {
                    has_conducted_transaction = true;
                }
                if let Some(amount) = tx.output_map.get(address) {
                    outputs_total = outputs_total.saturating_add(*amount);
                }
            }
            if has_conducted_transaction {
                break;
            }
        }

        if has_conducted_transaction {
            outputs_total
        } else {
            STARTING_BALANCE.saturating_add(outputs_total)
        }
    }
}
