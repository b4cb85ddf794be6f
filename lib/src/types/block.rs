use crate::sha256::Hash;
use crate::types::Transaction;
use crate::util::{MerkleRoot, Saveable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Write};
// save and load expecting CBOR from ciborium as format
impl Saveable for Block {
    fn load<I: Read>(reader: I) -> IoResult<Self> {
        ciborium::de::from_reader(reader)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to deserialize Block"))
    }
    fn save<O: Write>(&self, writer: O) -> IoResult<()> {
        ciborium::ser::into_writer(self, writer)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to serialize Block"))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Block {
    pub header: BlockHeader,
    /// Digest claimed at assembly time; receivers recompute `header.hash()`
    /// against it.
    pub hash: Hash,
    /// Included transactions in mempool drain order, never resorted.
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        let hash = header.hash();
        Block {
            header,
            hash,
            transactions,
        }
    }

    /// The fixed first block of every chain. Deterministic on every node so
    /// all chains share one genesis hash.
    pub fn genesis() -> Self {
        let header = BlockHeader::new(0, DateTime::UNIX_EPOCH, MerkleRoot::calculate(&[]), Hash::zero(), 0);
        Block::new(header, vec![])
    }

    /// Assemble the successor of `parent` from the given transactions, in
    /// inclusion order.
    pub fn build_on(parent: &Block, transactions: Vec<Transaction>) -> Self {
        let header = BlockHeader::new(
            parent.header.sequence_index + 1,
            Utc::now(),
            MerkleRoot::calculate(&transactions),
            parent.hash,
            0,
        );
        Block::new(header, transactions)
    }

    /// Ids of the included transactions, in inclusion order.
    pub fn transaction_ids(&self) -> Vec<Uuid> {
        self.transactions.iter().map(|tx| tx.id).collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BlockHeader {
    pub sequence_index: u64,
    pub created_at: DateTime<Utc>,
    pub merkle_root: MerkleRoot,
    pub previous_block_hash: Hash,
    /// Placeholder; no proof-of-work search is performed.
    pub nonce: u64,
}

impl BlockHeader {
    pub fn new(
        sequence_index: u64,
        created_at: DateTime<Utc>,
        merkle_root: MerkleRoot,
        previous_block_hash: Hash,
        nonce: u64,
    ) -> Self {
        BlockHeader {
            sequence_index,
            created_at,
            merkle_root,
            previous_block_hash,
            nonce,
        }
    }

    pub fn hash(&self) -> Hash {
        Hash::hash(self)
    }
}
