use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transaction is malformed: {0}")]
    MalformedTransaction(&'static str),
    #[error("transaction {0} failed integrity digest verification")]
    IntegrityMismatch(Uuid),
    #[error("transaction {0} is already known")]
    DuplicateTransaction(Uuid),
    #[error("block is malformed: {0}")]
    MalformedBlock(&'static str),
    #[error("block {0} does not link to the local head")]
    LinkageMismatch(u64),
    #[error("block {0} merkle root does not match its transactions")]
    MerkleMismatch(u64),
    #[error("block {0} hash does not match its header")]
    HashMismatch(u64),
    #[error("append of block {0} lost the race against the current head")]
    StaleHead(u64),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
