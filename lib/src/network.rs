//! Wire protocol between nodes: length-prefixed CBOR frames over TCP.

use crate::types::{Block, Transaction};
use serde::{Deserialize, Serialize};
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Message {
    /// Client submission; the receiving node stamps the identity fields.
    SubmitTransaction { payload: Vec<u8> },
    /// Reply to a submission, carrying the stored transaction.
    TransactionAccepted(Transaction),
    /// Peer fanout of an admitted transaction. Receivers never re-broadcast.
    NewTransaction(Transaction),
    /// Ask an authority node to assemble a block now.
    RequestMine,
    Mined(Block),
    NothingToMine,
    /// Peer fanout of a committed block.
    NewBlock(Block),
    /// Join protocol: the joiner announces its own listening address.
    RegisterPeer(String),
    /// Flood-once propagation of newly learned peer addresses.
    RegisterPeersBulk(Vec<String>),
    /// Reply to `RegisterPeer`: complete membership, responder included.
    PeerList(Vec<String>),
    FetchChain,
    ChainSnapshot(Vec<Block>),
    Ack,
    Rejected(String),
}

impl Message {
    pub async fn send_async<O: AsyncWrite + Unpin>(&self, stream: &mut O) -> IoResult<()> {
        let mut frame: Vec<u8> = vec![];
        ciborium::ser::into_writer(self, &mut frame)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to serialize Message"))?;
        stream.write_u64_le(frame.len() as u64).await?;
        stream.write_all(&frame).await?;
        stream.flush().await?;
        Ok(())
    }

    pub async fn receive_async<I: AsyncRead + Unpin>(stream: &mut I) -> IoResult<Self> {
        let len = stream.read_u64_le().await? as usize;
        let mut frame = vec![0u8; len];
        stream.read_exact(&mut frame).await?;
        ciborium::de::from_reader(frame.as_slice())
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to deserialize Message"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_survive_the_wire_format() {
        let tx = Transaction::originate("test-node", b"reading".to_vec());
        let message = Message::NewTransaction(tx.clone());

        let (mut sender, mut receiver) = tokio::io::duplex(4096);
        message.send_async(&mut sender).await.expect("send");
        let decoded = Message::receive_async(&mut receiver)
            .await
            .expect("receive");

        match decoded {
            Message::NewTransaction(received) => assert_eq!(received, tx),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_frame_is_invalid_data() {
        let mut frame: Vec<u8> = vec![];
        frame.extend_from_slice(&4u64.to_le_bytes());
        frame.extend_from_slice(b"junk");
        let mut cursor = frame.as_slice();
        let error = Message::receive_async(&mut cursor)
            .await
            .expect_err("junk must not decode");
        assert_eq!(error.kind(), IoErrorKind::InvalidData);
    }
}
