use crate::sha256::Hash;
use crate::types::Transaction;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Result as IoResult, Write};
use std::path::Path;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MerkleRoot(Hash);

impl MerkleRoot {
    /// Reduce an ordered list of transactions to a single digest.
    ///
    /// Each transaction is hashed in inclusion order to a leaf digest,
    /// adjacent digests are paired and hashed until one remains; a level
    /// with an odd count duplicates its last digest before pairing. The
    /// empty list reduces to the zero sentinel, which is also the genesis
    /// merkle root. Reordering the input changes the result.
    pub fn calculate(transactions: &[Transaction]) -> MerkleRoot {
        if transactions.is_empty() {
            return MerkleRoot(Hash::zero());
        }
        let mut layer: Vec<Hash> = transactions.iter().map(|tx| Hash::hash(tx)).collect();
        while layer.len() > 1 {
            if layer.len() % 2 == 1 {
                let last = *layer.last().expect("layer is non-empty");
                layer.push(last);
            }
            layer = layer
                .chunks(2)
                .map(|pair| Hash::hash(&(pair[0], pair[1])))
                .collect();
        }
        MerkleRoot(layer[0])
    }

    pub fn hash(&self) -> Hash {
        self.0
    }
}

// save and load expecting CBOR from ciborium as format
pub trait Saveable
where
    Self: Sized,
{
    fn load<I: Read>(reader: I) -> IoResult<Self>;
    fn save<O: Write>(&self, writer: O) -> IoResult<()>;
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        let file = File::create(&path)?;
        self.save(file)
    }
    fn load_from_file<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let file = File::open(&path)?;
        Self::load(file)
    }
}
