use chrono::Utc;
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::blockchain::MINING_REWARD;
use crate::error::{LedgerError, Result};
use crate::wallet::Wallet;

/// Recipient address -> amount. The sender's own address holds the change.
pub type OutputMap = BTreeMap<String, u64>;

/// Who pays for a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransactionInput {
    /// Spent by a wallet; `amount` is the sender's balance at authoring time
    /// and `signature` covers the whole output map.
    Regular {
        timestamp: i64,
        amount: u64,
        address: String,
        signature: String,
    },
    /// Minted for the miner of a block. Never signed.
    Reward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub output_map: OutputMap,
    pub input: TransactionInput,
}

impl Transaction {
    /// Author a transfer of `amount` from `sender` to `recipient`.
    pub fn new(sender: &Wallet, recipient: &str, amount: u64) -> Result<Self> {
        if amount > sender.balance {
            return Err(LedgerError::InsufficientFunds {
                amount,
                balance: sender.balance,
            });
        }

        let mut output_map = OutputMap::new();
        output_map.insert(sender.public_key.clone(), sender.balance - amount);
        *output_map.entry(recipient.to_string()).or_insert(0) += amount;

        let input = signed_input(sender, sender.balance, &output_map)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            output_map,
            input,
        })
    }

    /// Reward paid to `miner` for sealing a block.
    pub fn reward(miner: &Wallet) -> Self {
        let mut output_map = OutputMap::new();
        output_map.insert(miner.public_key.clone(), MINING_REWARD);
        Self {
            id: Uuid::new_v4().to_string(),
            output_map,
            input: TransactionInput::Reward,
        }
    }

    /// Merge another transfer into this pending transaction and re-sign.
    ///
    /// The amount comes out of the sender's change output, so the declared
    /// input amount stays equal to the sum of the outputs.
    pub fn update(&mut self, sender: &Wallet, recipient: &str, amount: u64) -> Result<()> {
        let declared = match &self.input {
            TransactionInput::Regular { amount, .. } => *amount,
            TransactionInput::Reward => return Err(LedgerError::RewardNotUpdatable),
        };

        let change = self
            .output_map
            .get(&sender.public_key)
            .copied()
            .unwrap_or(0);
        if amount > change {
            return Err(LedgerError::InsufficientFunds {
                amount,
                balance: change,
            });
        }

        self.output_map
            .insert(sender.public_key.clone(), change - amount);
        *self.output_map.entry(recipient.to_string()).or_insert(0) += amount;

        self.input = signed_input(sender, declared, &self.output_map)?;
        Ok(())
    }

    /// Address of the signing sender; `None` for rewards.
    pub fn sender(&self) -> Option<&str> {
        match &self.input {
            TransactionInput::Regular { address, .. } => Some(address),
            TransactionInput::Reward => None,
        }
    }

    pub fn is_reward(&self) -> bool {
        matches!(self.input, TransactionInput::Reward)
    }

    pub fn total_output_amount(&self) -> u128 {
        self.output_map.values().map(|a| *a as u128).sum()
    }

    /// Check the transaction on its own terms. Problems are logged, never raised.
    ///
    /// Regular: outputs must add up to the declared input and the signature
    /// must verify over the output map. Reward: exactly one output worth
    /// [`MINING_REWARD`].
    pub fn is_valid(&self) -> bool {
        match &self.input {
            TransactionInput::Regular {
                amount,
                address,
                signature,
                ..
            } => {
                if self.total_output_amount() != *amount as u128 {
                    error!(
                        "Invalid transaction {} from {address}: outputs do not add up to {amount}",
                        self.id
                    );
                    return false;
                }
                if !crate::crypto::verify_signature(address, &self.output_map, signature) {
                    error!(
                        "Invalid transaction {} from {address}: bad signature",
                        self.id
                    );
                    return false;
                }
                true
            }
            TransactionInput::Reward => {
                let mut amounts = self.output_map.values();
                match (amounts.next(), amounts.next()) {
                    (Some(&MINING_REWARD), None) => true,
                    _ => {
                        error!("Invalid reward transaction {}: wrong payout", self.id);
                        false
                    }
                }
            }
        }
    }
}

fn signed_input(sender: &Wallet, amount: u64, output_map: &OutputMap) -> Result<TransactionInput> {
    Ok(TransactionInput::Regular {
        timestamp: Utc::now().timestamp_millis(),
        amount,
        address: sender.public_key.clone(),
        signature: sender.sign(output_map)?,
    })
}
