mod block;
mod chain;
mod ledger;
mod mempool;
mod transaction;

pub use block::{Block, BlockHeader};
pub use chain::ChainLedger;
pub use ledger::Ledger;
pub use mempool::Mempool;
pub use transaction::Transaction;
