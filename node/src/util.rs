//! Startup plumbing: snapshot load/save and the network join round.

use crate::context::NodeContext;
use anyhow::{Context, Result, bail};
use ledgerlib::network::Message;
use ledgerlib::types::Ledger;
use ledgerlib::util::Saveable;
use std::path::Path;
use tokio::net::TcpStream;
use tokio::time::{self, Duration};
use tracing::{error, info, warn};

/// Load the durable ledger snapshot, or start a fresh chain at genesis.
pub fn load_or_init_ledger(path: &str) -> Result<Ledger> {
    if Path::new(path).exists() {
        let ledger = Ledger::load_from_file(path)
            .with_context(|| format!("failed to load ledger snapshot from {path}"))?;
        info!(
            path,
            blocks = ledger.chain().length(),
            pending = ledger.mempool().size(),
            "loaded ledger snapshot"
        );
        Ok(ledger)
    } else {
        info!(path, "no snapshot found, starting at genesis");
        Ok(Ledger::new())
    }
}

/// Join the network through one known node: announce our address, take over
/// the returned membership list, and bootstrap our chain from the same node
/// if we are still at genesis.
///
/// Seeds are tried in order until one answers; a node with no reachable
/// seed starts alone and waits to be joined.
pub async fn join_network(ctx: &NodeContext, seeds: &[String]) {
    for seed in seeds {
        if seed == &ctx.config.self_address {
            continue;
        }
        match join_via(ctx, seed).await {
            Ok(()) => return,
            Err(e) => warn!(seed = %seed, error = %e, "join attempt failed"),
        }
    }
    if !seeds.is_empty() {
        warn!("no seed node reachable, starting with an empty registry");
    }
}

async fn join_via(ctx: &NodeContext, seed: &str) -> Result<()> {
    let mut stream = TcpStream::connect(seed).await?;
    Message::RegisterPeer(ctx.config.self_address.clone())
        .send_async(&mut stream)
        .await?;
    match Message::receive_async(&mut stream).await? {
        Message::PeerList(members) => {
            let added = ctx.peers.register_bulk(&members);
            info!(seed = %seed, members = members.len(), added, "joined network");
        }
        other => bail!("unexpected join reply: {other:?}"),
    }
    bootstrap_chain(ctx, seed).await
}

/// Fetch the seed's chain and adopt it wholesale while ours is still at
/// genesis. This is not fork choice: once past bootstrap, a diverging peer
/// chain is rejected by linkage validation and never reconciled.
async fn bootstrap_chain(ctx: &NodeContext, seed: &str) -> Result<()> {
    {
        let ledger = ctx.ledger.read().await;
        if ledger.chain().length() > 1 {
            return Ok(());
        }
    }
    let mut stream = TcpStream::connect(seed).await?;
    Message::FetchChain.send_async(&mut stream).await?;
    match Message::receive_async(&mut stream).await? {
        Message::ChainSnapshot(blocks) => {
            if blocks.len() <= 1 {
                // the seed is at genesis too, nothing to adopt
                return Ok(());
            }
            let mut ledger = ctx.ledger.write().await;
            let adopted = ledger.adopt_chain(blocks)?;
            info!(seed = %seed, blocks = adopted, "bootstrapped chain from seed");
            Ok(())
        }
        other => bail!("unexpected snapshot reply: {other:?}"),
    }
}

/// Periodically persist the ledger snapshot. A failed write is logged and
/// retried on the next tick; the in-memory state stays authoritative.
pub async fn save_task(ctx: NodeContext) {
    let mut tick = time::interval(Duration::from_secs(15));
    loop {
        tick.tick().await;
        let ledger = ctx.ledger.read().await;
        if let Err(e) = ledger.save_to_file(&ctx.config.ledger_file) {
            error!(error = %e, path = %ctx.config.ledger_file, "failed to save ledger snapshot");
        }
    }
}
