//! Block assembly on the authority node.
//!
//! Only the node configured with the authority role runs this; every other
//! node receives and validates the resulting blocks.

use crate::broadcast::Broadcaster;
use crate::context::NodeContext;
use ledgerlib::network::Message;
use ledgerlib::types::Block;
use tokio::time::{Duration, interval};
use tracing::{debug, error, info};

pub struct BlockAssembler {
    ctx: NodeContext,
    broadcaster: Broadcaster,
}

impl BlockAssembler {
    pub fn new(ctx: NodeContext) -> Self {
        let broadcaster = Broadcaster::new(ctx.peers.clone());
        BlockAssembler { ctx, broadcaster }
    }

    /// Drain the mempool into a candidate block and commit it locally,
    /// then fan the block out to every peer.
    ///
    /// Returns `Ok(None)` when there is nothing to mine, with no side
    /// effects. Draining does not remove entries and eviction only happens
    /// inside a successful commit, so a commit that loses against a newer
    /// head drops nothing; the pending transactions stay in place and the
    /// next trigger retries against the new head.
    pub async fn try_assemble(&self) -> ledgerlib::error::Result<Option<Block>> {
        let block = {
            let mut ledger = self.ctx.ledger.write().await;
            let transactions = ledger.mempool().drain(ledgerlib::BLOCK_TRANSACTION_CAP);
            if transactions.is_empty() {
                return Ok(None);
            }
            let block = Block::build_on(ledger.chain().head(), transactions);
            ledger.commit_block(block.clone())?;
            block
        };
        info!(
            index = block.header.sequence_index,
            transactions = block.transactions.len(),
            hash = %block.hash,
            "assembled and committed block"
        );
        // peer delivery is best-effort; the local commit above stands
        // regardless of how many peers take the block
        let delivered = self
            .broadcaster
            .fanout(Message::NewBlock(block.clone()))
            .await;
        debug!(index = block.header.sequence_index, delivered, "block fanout settled");
        Ok(Some(block))
    }

    /// Scheduled assembly loop: fires on the slot timer and on the
    /// mempool-threshold signal raised by connection handlers.
    pub async fn run(self) {
        let mut slot = interval(Duration::from_secs(self.ctx.config.slot_secs));
        // the first tick resolves immediately; skip it
        slot.tick().await;
        loop {
            tokio::select! {
                _ = slot.tick() => {}
                _ = self.ctx.assembly_signal.notified() => {}
            }
            match self.try_assemble().await {
                Ok(Some(_)) => {}
                Ok(None) => debug!("nothing to mine"),
                Err(e) => error!(error = %e, "block assembly failed, will retry"),
            }
        }
    }
}
