//! Known peer addresses.

use dashmap::DashMap;

/// Mutable set of peer node addresses, excluding our own. No ordering
/// guarantee beyond "no duplicates".
pub struct PeerRegistry {
    self_address: String,
    peers: DashMap<String, ()>,
}

impl PeerRegistry {
    pub fn new(self_address: String) -> Self {
        PeerRegistry {
            self_address,
            peers: DashMap::new(),
        }
    }

    /// Idempotent add. Returns true when the address was not known before.
    /// Our own address and empty strings are silently ignored.
    pub fn register(&self, address: &str) -> bool {
        if address.is_empty() || address == self.self_address {
            return false;
        }
        self.peers.insert(address.to_string(), ()).is_none()
    }

    /// Idempotent bulk add with the same exclusions. Returns how many
    /// addresses were actually new.
    pub fn register_bulk(&self, addresses: &[String]) -> usize {
        addresses
            .iter()
            .filter(|address| self.register(address))
            .count()
    }

    /// Snapshot of the current membership, for fanout.
    pub fn all(&self) -> Vec<String> {
        self.peers.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
