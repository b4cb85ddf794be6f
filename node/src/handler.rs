//! Per-connection message loop.

use crate::assembler::BlockAssembler;
use crate::broadcast::Broadcaster;
use crate::context::NodeContext;
use ledgerlib::network::Message;
use ledgerlib::validation;
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

pub async fn handle_connection(mut socket: TcpStream, ctx: NodeContext) {
    loop {
        let message = match Message::receive_async(&mut socket).await {
            Ok(message) => message,
            Err(e) if e.kind() == IoErrorKind::UnexpectedEof => return,
            Err(e) => {
                debug!(error = %e, "invalid message from peer, closing connection");
                return;
            }
        };
        if let Err(e) = dispatch(&mut socket, &ctx, message).await {
            debug!(error = %e, "connection handling failed, closing connection");
            return;
        }
    }
}

async fn dispatch(socket: &mut TcpStream, ctx: &NodeContext, message: Message) -> IoResult<()> {
    use Message::*;
    match message {
        SubmitTransaction { payload } => {
            let admitted = {
                let mut ledger = ctx.ledger.write().await;
                ledger.admit_local(&ctx.config.node_id, payload)
            };
            match admitted {
                Ok(tx) => {
                    info!(id = %tx.id, "admitted local transaction");
                    TransactionAccepted(tx.clone()).send_async(socket).await?;
                    let broadcaster = Broadcaster::new(ctx.peers.clone());
                    broadcaster.fanout(NewTransaction(tx)).await;
                    maybe_signal_assembly(ctx).await;
                }
                Err(e) => {
                    warn!(error = %e, "rejected submitted transaction");
                    Rejected(e.to_string()).send_async(socket).await?;
                }
            }
        }
        NewTransaction(tx) => {
            let id = tx.id;
            let admitted = match validation::validate_transaction(&tx) {
                Ok(()) => ctx.ledger.write().await.admit(tx).map(|_| ()),
                Err(e) => Err(e),
            };
            // no re-fanout here: the originating node already broadcast it
            match admitted {
                Ok(()) => {
                    debug!(%id, "admitted transaction from peer");
                    Ack.send_async(socket).await?;
                    maybe_signal_assembly(ctx).await;
                }
                Err(e) => {
                    warn!(%id, error = %e, "rejected transaction from peer");
                    Rejected(e.to_string()).send_async(socket).await?;
                }
            }
        }
        NewBlock(block) => {
            let index = block.header.sequence_index;
            let committed = ctx.ledger.write().await.commit_block(block);
            match committed {
                Ok(()) => {
                    info!(index, "committed block from peer");
                    Ack.send_async(socket).await?;
                }
                Err(e) => {
                    warn!(index, error = %e, "rejected block from peer");
                    Rejected(e.to_string()).send_async(socket).await?;
                }
            }
        }
        RequestMine => {
            if !ctx.config.authority {
                Rejected("not an authority node".to_string())
                    .send_async(socket)
                    .await?;
                return Ok(());
            }
            match BlockAssembler::new(ctx.clone()).try_assemble().await {
                Ok(Some(block)) => Mined(block).send_async(socket).await?,
                Ok(None) => NothingToMine.send_async(socket).await?,
                Err(e) => {
                    warn!(error = %e, "assembly on request failed");
                    Rejected(e.to_string()).send_async(socket).await?;
                }
            }
        }
        RegisterPeer(address) => {
            if ctx.peers.register(&address) {
                info!(peer = %address, "registered joining peer");
                // flood the newcomer's address once to everyone we already
                // knew; a failed propagation is not repaired
                let others: Vec<String> = ctx
                    .peers
                    .all()
                    .into_iter()
                    .filter(|known| known != &address)
                    .collect();
                let broadcaster = Broadcaster::new(ctx.peers.clone());
                broadcaster
                    .fanout_to(others, RegisterPeersBulk(vec![address]))
                    .await;
            }
            let mut members = ctx.peers.all();
            members.push(ctx.config.self_address.clone());
            PeerList(members).send_async(socket).await?;
        }
        RegisterPeersBulk(addresses) => {
            let added = ctx.peers.register_bulk(&addresses);
            if added > 0 {
                info!(added, "learned peers from flood propagation");
            }
            Ack.send_async(socket).await?;
        }
        FetchChain => {
            let snapshot = ctx.ledger.read().await.chain_snapshot();
            ChainSnapshot(snapshot).send_async(socket).await?;
        }
        TransactionAccepted(_) | Mined(_) | NothingToMine | PeerList(_) | ChainSnapshot(_)
        | Ack | Rejected(_) => {
            return Err(IoError::new(
                IoErrorKind::InvalidData,
                "reply-only message received as a request",
            ));
        }
    }
    Ok(())
}

/// Wake the assembly loop early once the mempool crosses the configured
/// threshold. Only meaningful on the authority node.
async fn maybe_signal_assembly(ctx: &NodeContext) {
    if !ctx.config.authority {
        return;
    }
    let size = ctx.ledger.read().await.mempool().size();
    if size >= ctx.config.assembly_threshold {
        ctx.assembly_signal.notify_one();
    }
}
