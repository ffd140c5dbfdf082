pub mod block;
pub mod model;

pub use block::{Block, BlockData, MineControl};
pub use model::{Blockchain, ReplaceOutcome};

/// Target milliseconds between blocks; faster blocks raise difficulty.
pub const MINE_RATE_MS: i64 = 1000;

/// Difficulty carried by the genesis block (leading zero bits).
pub const INITIAL_DIFFICULTY: u32 = 1;

/// Difficulty never drops below this.
pub const MIN_DIFFICULTY: u32 = 1;

/// Balance of an address that has never sent anything.
pub const STARTING_BALANCE: u64 = 1000;

/// Payout of the single reward transaction allowed per block.
pub const MINING_REWARD: u64 = 50;

/* ---------- Genesis block ---------- */

pub const GENESIS_TIMESTAMP: i64 = 1;
pub const GENESIS_LAST_HASH: &str = "-----";
pub const GENESIS_HASH: &str = "hash-one";
