pub mod model;
pub mod pool;

pub use model::{OutputMap, Transaction, TransactionInput};
pub use pool::TransactionPool;
