//! Best-effort fanout of local events to every known peer.

use crate::peers::PeerRegistry;
use futures::future::join_all;
use ledgerlib::network::Message;
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::{debug, warn};

pub struct Broadcaster {
    peers: Arc<PeerRegistry>,
}

impl Broadcaster {
    pub fn new(peers: Arc<PeerRegistry>) -> Self {
        Broadcaster { peers }
    }

    /// Deliver `message` to every registered peer, one task per peer.
    ///
    /// Waits for all deliveries to settle and returns how many succeeded.
    /// A failure against one peer is logged and never cancels the others,
    /// fails the caller, or queues a retry.
    pub async fn fanout(&self, message: Message) -> usize {
        self.fanout_to(self.peers.all(), message).await
    }

    pub async fn fanout_to(&self, addresses: Vec<String>, message: Message) -> usize {
        if addresses.is_empty() {
            return 0;
        }
        let total = addresses.len();
        let deliveries = addresses.into_iter().map(|address| {
            let message = message.clone();
            tokio::spawn(async move {
                match Self::deliver(&address, message).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(peer = %address, error = %e, "fanout delivery failed");
                        false
                    }
                }
            })
        });
        let delivered = join_all(deliveries)
            .await
            .into_iter()
            .filter(|outcome| matches!(outcome, Ok(true)))
            .count();
        debug!(delivered, total, "fanout settled");
        delivered
    }

    async fn deliver(address: &str, message: Message) -> std::io::Result<()> {
        let mut stream = TcpStream::connect(address).await?;
        message.send_async(&mut stream).await?;
        // read the single reply so a rejection shows up in our logs; it is
        // never acted upon
        if let Message::Rejected(reason) = Message::receive_async(&mut stream).await? {
            warn!(peer = %address, %reason, "peer rejected broadcast");
        }
        Ok(())
    }
}
