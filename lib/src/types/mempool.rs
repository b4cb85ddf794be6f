use crate::error::{LedgerError, Result};
use crate::types::Transaction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// FIFO staging set of transactions not yet embedded in a committed block.
/// Unique by transaction id; insertion order is the block inclusion order.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Mempool {
    pending: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Mempool { pending: vec![] }
    }

    /// Admit a transaction at the tail of the FIFO order and return the
    /// stored entry.
    ///
    /// Admission is idempotent with respect to the id: a second admit of
    /// the same id fails with `DuplicateTransaction` and changes nothing.
    pub fn admit(&mut self, tx: Transaction) -> Result<Transaction> {
        tx.check_fields()?;
        tx.verify_digest()?;
        if self.contains(&tx.id) {
            return Err(LedgerError::DuplicateTransaction(tx.id));
        }
        self.pending.push(tx.clone());
        Ok(tx)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.pending.iter().any(|tx| tx.id == *id)
    }

    /// Up to `limit` transactions in FIFO order. Entries are not removed;
    /// removal only happens when a block containing them commits.
    pub fn drain(&self, limit: usize) -> Vec<Transaction> {
        self.pending.iter().take(limit).cloned().collect()
    }

    /// Remove the given ids. Absent ids are ignored. Returns the number of
    /// entries actually removed.
    pub fn evict(&mut self, ids: &[Uuid]) -> usize {
        let before = self.pending.len();
        self.pending.retain(|tx| !ids.contains(&tx.id));
        before - self.pending.len()
    }

    pub fn size(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
