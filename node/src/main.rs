use anyhow::Result;
use argh::FromArgs;
use ledgerlib::util::Saveable;
use node_lib::assembler::BlockAssembler;
use node_lib::{NodeConfig, NodeContext, handler, util};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A replicated append-only ledger node
struct Args {
    #[argh(option, default = "9000")]
    /// port number
    port: u16,
    #[argh(option)]
    /// identifier stamped on locally originated transactions (defaults to node-<port>)
    node_id: Option<String>,
    #[argh(option, default = "String::from(\"./ledger.cbor\")")]
    /// ledger snapshot file location
    ledger_file: String,
    #[argh(switch)]
    /// act as the authority node that assembles blocks
    authority: bool,
    #[argh(option, default = "ledgerlib::ASSEMBLY_SLOT_SECS")]
    /// seconds between assembly timer ticks
    slot_secs: u64,
    #[argh(option, default = "ledgerlib::ASSEMBLY_THRESHOLD")]
    /// mempool size that triggers assembly ahead of the timer
    assembly_threshold: usize,
    #[argh(positional)]
    /// addresses of initial seed nodes
    seeds: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Args = argh::from_env();
    let node_id = args
        .node_id
        .unwrap_or_else(|| format!("node-{}", args.port));
    let config = NodeConfig {
        port: args.port,
        node_id,
        self_address: format!("127.0.0.1:{}", args.port),
        authority: args.authority,
        slot_secs: args.slot_secs,
        assembly_threshold: args.assembly_threshold,
        ledger_file: args.ledger_file,
    };

    let ledger = util::load_or_init_ledger(&config.ledger_file)?;
    let ctx = NodeContext::new(config, ledger);

    util::join_network(&ctx, &args.seeds).await;
    info!(peers = ctx.peers.len(), "peer registry populated");

    tokio::spawn(util::save_task(ctx.clone()));

    if ctx.config.authority {
        info!(
            slot_secs = ctx.config.slot_secs,
            threshold = ctx.config.assembly_threshold,
            "starting assembly loop"
        );
        tokio::spawn(BlockAssembler::new(ctx.clone()).run());
    }

    let addr = format!("0.0.0.0:{}", ctx.config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, authority = ctx.config.authority, "listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, _) = accepted?;
                tokio::spawn(handler::handle_connection(socket, ctx.clone()));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    // one final snapshot on the way out
    let ledger = ctx.ledger.read().await;
    if let Err(e) = ledger.save_to_file(&ctx.config.ledger_file) {
        error!(error = %e, "failed to save final snapshot");
    }
    Ok(())
}
