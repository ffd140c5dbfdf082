use log::{info, warn};
use std::sync::Mutex;

use crate::blockchain::{Block, BlockData, Blockchain, MineControl};
use crate::error::Result;
use crate::transaction::{Transaction, TransactionPool};
use crate::wallet::Wallet;

/// Mine `data` on a snapshot of the current tip and append the result.
///
/// The chain lock is only taken to read the tip and to commit, never during
/// the search. If the tip moved meanwhile (a block from elsewhere or an
/// adopted chain) the block is dropped with `StaleTip`. `on_commit` runs with
/// the chain still locked, right after the append.
pub fn mine_block<F>(
    blockchain: &Mutex<Blockchain>,
    data: BlockData,
    control: &MineControl,
    on_commit: F,
) -> Result<(usize, Block)>
where
    F: FnOnce(&[Block]),
{
    let tip = blockchain
        .lock()
        .expect("mutex poisoned")
        .last_block()
        .clone();
    let block = Block::mine_with(&tip, data, control)?;
    commit(blockchain, block, on_commit)
}

fn commit<F>(blockchain: &Mutex<Blockchain>, block: Block, on_commit: F) -> Result<(usize, Block)>
where
    F: FnOnce(&[Block]),
{
    let mut bc = blockchain.lock().expect("mutex poisoned");
    bc.push_mined(block.clone())
        .inspect_err(|e| warn!("MINER - dropping block {}: {}", block.hash, e))?;
    on_commit(&bc.chain);
    Ok((bc.len() - 1, block))
}

/// Seal the pool's valid transactions plus a reward for `wallet` into a new
/// block, then drop every entry the pool held when the block was assembled.
///
/// Transactions that arrive during the search stay pooled. On an aborted or
/// stale search nothing changes. The caller is responsible for broadcasting
/// the block.
pub fn mine_transactions(
    blockchain: &Mutex<Blockchain>,
    pool: &Mutex<TransactionPool>,
    wallet: &Mutex<Wallet>,
    control: &MineControl,
) -> Result<(usize, Block)> {
    let (snapshot, mut txs) = {
        let pool = pool.lock().expect("mutex poisoned");
        let ids: Vec<String> = pool.transactions().keys().cloned().collect();
        (ids, pool.valid_transactions())
    };
    let included = txs.len();
    txs.push(Transaction::reward(&wallet.lock().expect("mutex poisoned")));

    let (index, block) = mine_block(blockchain, txs.into(), control, |_| {
        pool.lock()
            .expect("mutex poisoned")
            .remove_transactions(&snapshot);
    })?;

    info!(
        "MINER - sealed block #{} (hash={}, difficulty={}, txs={} + reward)",
        index, block.hash, block.difficulty, included
    );
    Ok((index, block))
}
