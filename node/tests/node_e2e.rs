//! End-to-end tests over real sockets: in-process nodes driven through the
//! wire protocol.

use ledgerlib::network::Message;
use ledgerlib::types::{Ledger, Transaction};
use node_lib::assembler::BlockAssembler;
use node_lib::{NodeConfig, NodeContext, handler, util};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Duration, sleep};

async fn spawn_node(authority: bool, assembly_threshold: usize) -> (String, NodeContext) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let local = listener.local_addr().expect("local addr");
    let config = NodeConfig {
        port: local.port(),
        node_id: format!("test-node-{}", local.port()),
        self_address: local.to_string(),
        authority,
        slot_secs: 3600,
        assembly_threshold,
        ledger_file: format!("unused-{}.cbor", local.port()),
    };
    let ctx = NodeContext::new(config, Ledger::new());
    let accept_ctx = ctx.clone();
    tokio::spawn(async move {
        loop {
            if let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handler::handle_connection(socket, accept_ctx.clone()));
            }
        }
    });
    (local.to_string(), ctx)
}

async fn request(address: &str, message: Message) -> Message {
    let mut stream = TcpStream::connect(address).await.expect("connect");
    message.send_async(&mut stream).await.expect("send request");
    Message::receive_async(&mut stream)
        .await
        .expect("receive reply")
}

#[tokio::test]
async fn submit_mine_and_snapshot_round_trip() {
    let (address, _ctx) = spawn_node(true, usize::MAX).await;

    let payload = b"reading: 21.5 C".to_vec();
    let accepted = request(
        &address,
        Message::SubmitTransaction {
            payload: payload.clone(),
        },
    )
    .await;
    let tx = match accepted {
        Message::TransactionAccepted(tx) => tx,
        other => panic!("unexpected reply: {other:?}"),
    };
    assert_eq!(tx.payload, payload);
    assert!(!tx.id.is_nil());

    let mined = request(&address, Message::RequestMine).await;
    let block = match mined {
        Message::Mined(block) => block,
        other => panic!("unexpected reply: {other:?}"),
    };
    assert_eq!(block.header.sequence_index, 1);
    assert_eq!(block.transaction_ids(), vec![tx.id]);

    let snapshot = match request(&address, Message::FetchChain).await {
        Message::ChainSnapshot(blocks) => blocks,
        other => panic!("unexpected reply: {other:?}"),
    };
    assert_eq!(snapshot.len(), 2);
    let confirmed = snapshot[1]
        .transactions
        .iter()
        .find(|candidate| candidate.id == tx.id)
        .expect("transaction is in the snapshot");
    assert_eq!(confirmed.payload, payload);
}

#[tokio::test]
async fn mining_an_empty_mempool_has_no_side_effects() {
    let (address, ctx) = spawn_node(true, usize::MAX).await;

    let reply = request(&address, Message::RequestMine).await;
    assert!(matches!(reply, Message::NothingToMine));
    assert_eq!(ctx.ledger.read().await.chain().length(), 1);
}

#[tokio::test]
async fn non_authority_refuses_to_mine() {
    let (address, _ctx) = spawn_node(false, usize::MAX).await;

    let reply = request(&address, Message::RequestMine).await;
    assert!(matches!(reply, Message::Rejected(_)));
}

#[tokio::test]
async fn duplicate_and_tampered_receipts_are_rejected() {
    let (address, _ctx) = spawn_node(false, usize::MAX).await;

    let tx = Transaction::originate("elsewhere", b"reading".to_vec());
    let first = request(&address, Message::NewTransaction(tx.clone())).await;
    assert!(matches!(first, Message::Ack));

    let second = request(&address, Message::NewTransaction(tx.clone())).await;
    assert!(matches!(second, Message::Rejected(_)));

    let mut tampered = Transaction::originate("elsewhere", b"reading".to_vec());
    tampered.payload = b"rewritten".to_vec();
    let reply = request(&address, Message::NewTransaction(tampered)).await;
    assert!(matches!(reply, Message::Rejected(_)));
}

#[tokio::test]
async fn join_floods_membership_to_existing_peers() {
    let (addr_a, ctx_a) = spawn_node(true, usize::MAX).await;
    let (addr_b, ctx_b) = spawn_node(false, usize::MAX).await;
    let (addr_c, ctx_c) = spawn_node(false, usize::MAX).await;

    util::join_network(&ctx_b, std::slice::from_ref(&addr_a)).await;
    assert!(ctx_a.peers.all().contains(&addr_b));
    assert!(ctx_b.peers.all().contains(&addr_a));

    // C joins through A; A floods C's address to B and replies with the
    // full membership, so all three registries converge in one round
    util::join_network(&ctx_c, std::slice::from_ref(&addr_a)).await;
    assert!(ctx_a.peers.all().contains(&addr_c));
    assert!(ctx_b.peers.all().contains(&addr_c));
    let mut from_c = ctx_c.peers.all();
    from_c.sort();
    let mut expected = vec![addr_a.clone(), addr_b.clone()];
    expected.sort();
    assert_eq!(from_c, expected);
}

#[tokio::test]
async fn mined_blocks_reach_and_clean_peer_mempools() {
    let (addr_a, _ctx_a) = spawn_node(true, usize::MAX).await;
    let (_addr_b, ctx_b) = spawn_node(false, usize::MAX).await;

    util::join_network(&ctx_b, std::slice::from_ref(&addr_a)).await;

    let accepted = request(
        &addr_a,
        Message::SubmitTransaction {
            payload: b"shared".to_vec(),
        },
    )
    .await;
    let tx = match accepted {
        Message::TransactionAccepted(tx) => tx,
        other => panic!("unexpected reply: {other:?}"),
    };

    let mined = request(&addr_a, Message::RequestMine).await;
    assert!(matches!(mined, Message::Mined(_)));

    // the block fanout settled before the mine reply, so B has committed
    let ledger_b = ctx_b.ledger.read().await;
    assert_eq!(ledger_b.chain().length(), 2);
    assert!(ledger_b.mempool().is_empty());
    assert!(ledger_b.is_confirmed(&tx.id));
}

#[tokio::test]
async fn joining_late_bootstraps_the_seed_chain() {
    let (addr_a, _ctx_a) = spawn_node(true, usize::MAX).await;

    request(
        &addr_a,
        Message::SubmitTransaction {
            payload: b"early".to_vec(),
        },
    )
    .await;
    let mined = request(&addr_a, Message::RequestMine).await;
    assert!(matches!(mined, Message::Mined(_)));

    let (_addr_b, ctx_b) = spawn_node(false, usize::MAX).await;
    util::join_network(&ctx_b, std::slice::from_ref(&addr_a)).await;

    let ledger_b = ctx_b.ledger.read().await;
    assert_eq!(ledger_b.chain().length(), 2);
}

#[tokio::test]
async fn threshold_crossing_wakes_the_assembly_loop() {
    let (address, ctx) = spawn_node(true, 1).await;
    tokio::spawn(BlockAssembler::new(ctx.clone()).run());

    let accepted = request(
        &address,
        Message::SubmitTransaction {
            payload: b"urgent".to_vec(),
        },
    )
    .await;
    assert!(matches!(accepted, Message::TransactionAccepted(_)));

    let mut committed = false;
    for _ in 0..50 {
        if ctx.ledger.read().await.chain().length() == 2 {
            committed = true;
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    assert!(committed, "assembly loop never committed the block");
    assert!(ctx.ledger.read().await.mempool().is_empty());
}
