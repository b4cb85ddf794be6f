//! Process-wide state, passed explicitly to every component instead of
//! living in globals.

use crate::peers::PeerRegistry;
use ledgerlib::types::Ledger;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

pub struct NodeConfig {
    pub port: u16,
    /// Stamped as the origin on locally originated transactions.
    pub node_id: String,
    /// The address peers can reach us on; excluded from our own registry.
    pub self_address: String,
    /// Whether this node is the single writer allowed to assemble blocks.
    pub authority: bool,
    pub slot_secs: u64,
    pub assembly_threshold: usize,
    pub ledger_file: String,
}

/// Shared handles for the node's components. Cheap to clone; every task
/// gets its own copy.
#[derive(Clone)]
pub struct NodeContext {
    pub config: Arc<NodeConfig>,
    pub ledger: Arc<RwLock<Ledger>>,
    pub peers: Arc<PeerRegistry>,
    /// Raised by connection handlers when the mempool crosses the assembly
    /// threshold, so the authority does not have to wait for its slot timer.
    pub assembly_signal: Arc<Notify>,
}

impl NodeContext {
    pub fn new(config: NodeConfig, ledger: Ledger) -> Self {
        let peers = PeerRegistry::new(config.self_address.clone());
        NodeContext {
            config: Arc::new(config),
            ledger: Arc::new(RwLock::new(ledger)),
            peers: Arc::new(peers),
            assembly_signal: Arc::new(Notify::new()),
        }
    }
}
