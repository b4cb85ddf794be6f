//! Gatekeeping for transactions and blocks received from peers. Everything
//! crossing a node boundary passes here before it can touch local state.

use crate::error::{LedgerError, Result};
use crate::types::{Block, Transaction};
use crate::util::MerkleRoot;

/// Structural field check plus integrity digest recomputation. Either
/// failure is fatal to this transaction.
pub fn validate_transaction(tx: &Transaction) -> Result<()> {
    tx.check_fields()?;
    tx.verify_digest()
}

/// Full admission check for a block against the local head. The first
/// failure rejects the whole block; there is no partial acceptance of the
/// transactions inside it.
pub fn validate_block(block: &Block, local_head: &Block) -> Result<()> {
    let index = block.header.sequence_index;
    // structural completeness
    if block.transactions.is_empty() {
        return Err(LedgerError::MalformedBlock("block carries no transactions"));
    }
    for tx in &block.transactions {
        if tx.check_fields().is_err() {
            return Err(LedgerError::MalformedBlock(
                "included transaction is missing required fields",
            ));
        }
    }
    // linkage against the local head; a mismatch means the sender's chain
    // has diverged from ours and is rejected without reconciliation
    if block.header.previous_block_hash != local_head.hash
        || index != local_head.header.sequence_index + 1
    {
        return Err(LedgerError::LinkageMismatch(index));
    }
    // merkle root recomputation over the included transactions
    if MerkleRoot::calculate(&block.transactions) != block.header.merkle_root {
        return Err(LedgerError::MerkleMismatch(index));
    }
    // block hash recomputation over the header fields
    if block.header.hash() != block.hash {
        return Err(LedgerError::HashMismatch(index));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn valid_block() -> (Block, Block) {
        let genesis = Block::genesis();
        let txs = vec![
            Transaction::originate("test-node", b"one".to_vec()),
            Transaction::originate("test-node", b"two".to_vec()),
            Transaction::originate("test-node", b"three".to_vec()),
        ];
        let block = Block::build_on(&genesis, txs);
        (genesis, block)
    }

    #[test]
    fn well_formed_block_is_accepted() {
        let (head, block) = valid_block();
        assert!(validate_block(&block, &head).is_ok());
    }

    #[test]
    fn empty_block_is_malformed() {
        let head = Block::genesis();
        let block = Block::build_on(&head, vec![]);
        assert!(matches!(
            validate_block(&block, &head),
            Err(LedgerError::MalformedBlock(_))
        ));
    }

    #[test]
    fn block_with_nil_transaction_id_is_malformed() {
        let (head, mut block) = valid_block();
        block.transactions[0].id = Uuid::nil();
        assert!(matches!(
            validate_block(&block, &head),
            Err(LedgerError::MalformedBlock(_))
        ));
    }

    #[test]
    fn diverged_previous_hash_is_a_linkage_mismatch() {
        let (head, other_block) = valid_block();
        let unrelated_head = Block::build_on(
            &head,
            vec![Transaction::originate("test-node", b"fork".to_vec())],
        );
        assert_eq!(
            validate_block(&other_block, &unrelated_head),
            Err(LedgerError::LinkageMismatch(1))
        );
    }

    #[test]
    fn tampered_payload_changes_the_merkle_root() {
        let (head, mut block) = valid_block();
        block.transactions[1].payload = b"rewritten".to_vec();
        assert_eq!(
            validate_block(&block, &head),
            Err(LedgerError::MerkleMismatch(1))
        );
    }

    #[test]
    fn tampered_digest_changes_the_merkle_root() {
        let (head, mut block) = valid_block();
        let tampered = Transaction::originate("test-node", b"swap".to_vec());
        block.transactions[2].integrity_digest = tampered.integrity_digest;
        assert_eq!(
            validate_block(&block, &head),
            Err(LedgerError::MerkleMismatch(1))
        );
    }

    #[test]
    fn header_mutation_fails_hash_recomputation() {
        let (head, mut block) = valid_block();
        block.header.nonce = 99;
        assert_eq!(
            validate_block(&block, &head),
            Err(LedgerError::HashMismatch(1))
        );
    }
}
