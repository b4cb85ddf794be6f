use crate::error::{LedgerError, Result};
use crate::types::Block;
use serde::{Deserialize, Serialize};

/// The node's ordered sequence of committed blocks. Starts at the fixed
/// genesis block; blocks are only ever appended at the tail, never
/// rewritten.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChainLedger {
    blocks: Vec<Block>,
}

impl ChainLedger {
    pub fn new() -> Self {
        ChainLedger {
            blocks: vec![Block::genesis()],
        }
    }

    pub fn head(&self) -> &Block {
        self.blocks.last().expect("chain always holds genesis")
    }

    /// Append at the current tail.
    ///
    /// Of several appends racing against the same head, exactly one can
    /// succeed; the losers fail with `StaleHead` and the chain is unchanged.
    pub fn append(&mut self, block: Block) -> Result<()> {
        let head = self.head();
        if block.header.previous_block_hash != head.hash
            || block.header.sequence_index != head.header.sequence_index + 1
        {
            return Err(LedgerError::StaleHead(block.header.sequence_index));
        }
        self.blocks.push(block);
        Ok(())
    }

    pub fn length(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

impl Default for ChainLedger {
    fn default() -> Self {
        Self::new()
    }
}
