use crate::error::{LedgerError, Result};
use crate::sha256::Hash;
use crate::util::Saveable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Write};
use uuid::Uuid;

impl Saveable for Transaction {
    fn load<I: Read>(reader: I) -> IoResult<Self> {
        ciborium::de::from_reader(reader)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to deserialize Transaction"))
    }
    fn save<O: Write>(&self, writer: O) -> IoResult<()> {
        ciborium::ser::into_writer(self, writer)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to serialize Transaction"))
    }
}

/// A candidate ledger entry. Created exactly once, by the node that first
/// admits it, and immutable from then on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub origin_id: String,
    /// Opaque domain data; only its bytes matter for hashing.
    pub payload: Vec<u8>,
    pub integrity_digest: Hash,
}

impl Transaction {
    /// Create a transaction at its originating node. The id, timestamp and
    /// integrity digest are stamped here and never mutated afterwards.
    pub fn originate(origin_id: impl Into<String>, payload: Vec<u8>) -> Self {
        let id = Uuid::new_v4();
        let submitted_at = Utc::now();
        let integrity_digest = Self::digest_fields(&id, &submitted_at, &payload);
        Transaction {
            id,
            submitted_at,
            origin_id: origin_id.into(),
            payload,
            integrity_digest,
        }
    }

    // the digest covers (id, submitted_at, payload); origin is carried but
    // not covered
    fn digest_fields(id: &Uuid, submitted_at: &DateTime<Utc>, payload: &[u8]) -> Hash {
        Hash::hash(&(id, submitted_at, payload))
    }

    pub fn compute_digest(&self) -> Hash {
        Self::digest_fields(&self.id, &self.submitted_at, &self.payload)
    }

    /// Reject a transaction that is missing its identity fields before any
    /// hashing is attempted.
    pub fn check_fields(&self) -> Result<()> {
        if self.id.is_nil() {
            return Err(LedgerError::MalformedTransaction("id is nil"));
        }
        if self.origin_id.is_empty() {
            return Err(LedgerError::MalformedTransaction("origin id is empty"));
        }
        Ok(())
    }

    pub fn verify_digest(&self) -> Result<()> {
        if self.compute_digest() != self.integrity_digest {
            return Err(LedgerError::IntegrityMismatch(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn originate_stamps_verifiable_fields() {
        let tx = Transaction::originate("node-1", b"reading".to_vec());
        assert!(!tx.id.is_nil());
        assert!(tx.check_fields().is_ok());
        assert!(tx.verify_digest().is_ok());
    }

    #[test]
    fn tampered_payload_fails_digest_verification() {
        let mut tx = Transaction::originate("node-1", b"reading".to_vec());
        tx.payload = b"altered".to_vec();
        assert_eq!(tx.verify_digest(), Err(LedgerError::IntegrityMismatch(tx.id)));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let mut tx = Transaction::originate("node-1", vec![]);
        tx.id = Uuid::nil();
        assert!(matches!(
            tx.check_fields(),
            Err(LedgerError::MalformedTransaction(_))
        ));

        let mut tx = Transaction::originate("node-1", vec![]);
        tx.origin_id = String::new();
        assert!(matches!(
            tx.check_fields(),
            Err(LedgerError::MalformedTransaction(_))
        ));
    }
}
