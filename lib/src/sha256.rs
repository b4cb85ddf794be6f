use crate::U256;
use serde::{Deserialize, Serialize};
use sha256::digest;
use std::fmt;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(U256);

impl Hash {
    /// Digest of the canonical CBOR serialization of `data`.
    pub fn hash<T: serde::Serialize>(data: &T) -> Self {
        let mut serialized: Vec<u8> = vec![];
        if let Err(e) = ciborium::ser::into_writer(data, &mut serialized) {
            panic!("Failed to serialize data: {:?}", e);
        }
        let hash = digest(&serialized);
        let hash_bytes = hex::decode(hash).expect("sha256 emits valid hex");
        Hash(U256::from_big_endian(&hash_bytes))
    }

    /// The all-zero digest, used as the genesis previous-hash sentinel and
    /// the empty merkle root.
    pub fn zero() -> Self {
        Hash(U256::zero())
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_big_endian()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}
