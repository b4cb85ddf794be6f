use serde::{Deserialize, Serialize};
use uint::construct_uint;
construct_uint! {
// consisting of 4 x 64-bit words, the width of a SHA-256 digest
#[derive(Serialize, Deserialize)]
pub struct U256(4);
}
pub mod error;
pub mod network;
pub mod sha256;
pub mod types;
pub mod util;
pub mod validation;

// maximum number of transactions drained from the mempool into one block
pub const BLOCK_TRANSACTION_CAP: usize = 20;
// mempool size that triggers assembly ahead of the slot timer
pub const ASSEMBLY_THRESHOLD: usize = 5;
// seconds between assembly slots on the authority node
pub const ASSEMBLY_SLOT_SECS: u64 = 10;
