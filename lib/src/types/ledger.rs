use crate::error::{LedgerError, Result};
use crate::types::{Block, ChainLedger, Mempool, Transaction};
use crate::util::Saveable;
use crate::validation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Write};
use uuid::Uuid;

impl Saveable for Ledger {
    fn load<I: Read>(reader: I) -> IoResult<Self> {
        let mut ledger: Ledger = ciborium::de::from_reader(reader)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to deserialize Ledger"))?;
        // the confirmed index is not part of the snapshot
        ledger.rebuild_confirmed_index();
        Ok(ledger)
    }
    fn save<O: Write>(&self, writer: O) -> IoResult<()> {
        ciborium::ser::into_writer(self, writer)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to serialize Ledger"))
    }
}

/// Composite node state: the committed chain plus the staging mempool.
///
/// Every mutation that must be atomic with respect to the others
/// (admission, block commit) goes through `&mut self`, so one lock around
/// the ledger serializes them all.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Ledger {
    chain: ChainLedger,
    mempool: Mempool,
    #[serde(default, skip_serializing)]
    confirmed: HashSet<Uuid>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            chain: ChainLedger::new(),
            mempool: Mempool::new(),
            confirmed: HashSet::new(),
        }
    }

    pub fn chain(&self) -> &ChainLedger {
        &self.chain
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn is_confirmed(&self, id: &Uuid) -> bool {
        self.confirmed.contains(id)
    }

    /// Recompute the confirmed-transaction index from the chain, after
    /// loading a snapshot.
    pub fn rebuild_confirmed_index(&mut self) {
        self.confirmed.clear();
        for block in self.chain.blocks() {
            for tx in &block.transactions {
                self.confirmed.insert(tx.id);
            }
        }
    }

    /// Admit a transaction originated at this node. The ledger stamps the
    /// identity fields; the submitter only supplies the payload.
    pub fn admit_local(&mut self, origin_id: &str, payload: Vec<u8>) -> Result<Transaction> {
        self.admit(Transaction::originate(origin_id, payload))
    }

    /// Admit a transaction received in full, rejecting ids this node has
    /// already seen, pending or confirmed.
    pub fn admit(&mut self, tx: Transaction) -> Result<Transaction> {
        if self.confirmed.contains(&tx.id) {
            return Err(LedgerError::DuplicateTransaction(tx.id));
        }
        self.mempool.admit(tx)
    }

    /// Validate a block against the local head, append it and evict its
    /// transactions from the mempool.
    ///
    /// The three steps are all-or-nothing: eviction only runs after a
    /// successful append, so a rejected block leaves both the chain and the
    /// mempool untouched.
    pub fn commit_block(&mut self, block: Block) -> Result<()> {
        validation::validate_block(&block, self.chain.head())?;
        let ids = block.transaction_ids();
        self.chain.append(block)?;
        self.mempool.evict(&ids);
        self.confirmed.extend(ids);
        Ok(())
    }

    /// Read-only export of the whole chain, genesis first.
    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.chain.blocks().cloned().collect()
    }

    /// Adopt a peer's chain wholesale during bootstrap.
    ///
    /// Only permitted while the local chain is still at genesis. The
    /// incoming chain must share our genesis block, and every later block
    /// must link and re-hash correctly. Divergence discovered after
    /// bootstrap is never reconciled; there is no fork choice.
    pub fn adopt_chain(&mut self, blocks: Vec<Block>) -> Result<usize> {
        if self.chain.length() > 1 {
            return Err(LedgerError::StaleHead(
                self.chain.head().header.sequence_index,
            ));
        }
        let Some(genesis) = blocks.first() else {
            return Err(LedgerError::MalformedBlock("chain snapshot is empty"));
        };
        if genesis.hash != self.chain.head().hash {
            return Err(LedgerError::LinkageMismatch(0));
        }
        let mut chain = ChainLedger::new();
        for block in blocks.into_iter().skip(1) {
            validation::validate_block(&block, chain.head())?;
            chain.append(block)?;
        }
        let adopted = chain.length();
        self.chain = chain;
        self.rebuild_confirmed_index();
        // pending entries the adopted chain already confirmed are stale
        let stale: Vec<Uuid> = self
            .mempool
            .drain(self.mempool.size())
            .into_iter()
            .filter(|tx| self.confirmed.contains(&tx.id))
            .map(|tx| tx.id)
            .collect();
        self.mempool.evict(&stale);
        Ok(adopted)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
