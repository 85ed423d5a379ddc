use super::block::{Block, block_digest};
use super::pow::meets_difficulty;
use super::GENESIS_PREVIOUS_HASH;
use crate::error::ValidationError;

/// Validate an entire chain: genesis sentinel, then for every adjacent pair
/// linkage, hash integrity, proof-of-work and indexing. The first failing
/// check is reported; there is no partially valid chain.
pub fn validate_chain(chain: &[Block]) -> Result<(), ValidationError> {
    let genesis = chain.first().ok_or(ValidationError::EmptyChain)?;
    if genesis.block_index != 0 || genesis.previous_block_hash != GENESIS_PREVIOUS_HASH {
        return Err(ValidationError::InvalidGenesis);
    }

    for (i, pair) in chain.windows(2).enumerate() {
        let (prev, current) = (&pair[0], &pair[1]);
        let index = i + 1;

        // Check linkage
        if current.previous_block_hash != prev.current_block_hash {
            return Err(ValidationError::BrokenLink { index });
        }

        // Check hash integrity
        let digest = block_digest(
            current.timestamp,
            &current.previous_block_hash,
            &current.data,
            current.nonce,
            current.difficulty,
        );
        if current.current_block_hash != hex::encode(digest) {
            return Err(ValidationError::HashMismatch { index });
        }

        // Check the block was actually mined
        if !meets_difficulty(&digest, current.difficulty) {
            return Err(ValidationError::InsufficientWork {
                index,
                difficulty: current.difficulty,
            });
        }

        let expected = prev.block_index.wrapping_add(1);
        if current.block_index != expected {
            return Err(ValidationError::IndexGap {
                index,
                expected,
                found: current.block_index,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::block::hash_block;
    use crate::blockchain::testing::{mine_chain, mine_next};
    use serde_json::json;

    #[test]
    fn genesis_only_chain_is_valid() {
        let chain = vec![Block::genesis(1, 2)];
        assert_eq!(validate_chain(&chain), Ok(()));
    }

    #[test]
    fn empty_chain_is_invalid() {
        assert_eq!(validate_chain(&[]), Err(ValidationError::EmptyChain));
    }

    #[test]
    fn genesis_needs_sentinel_previous_hash() {
        let mut genesis = Block::genesis(1, 2);
        genesis.previous_block_hash = "abc".into();
        assert_eq!(validate_chain(&[genesis]), Err(ValidationError::InvalidGenesis));
    }

    #[test]
    fn genesis_must_start_at_index_zero() {
        let mut genesis = Block::genesis(1, 2);
        genesis.block_index = 5;
        assert_eq!(
            validate_chain(&[genesis.clone()]),
            Err(ValidationError::InvalidGenesis)
        );

        // Indices that stay contiguous from a shifted start are still refused.
        let mut chain = vec![genesis];
        let mut next = mine_next(&chain, vec![json!("tx")], 2);
        next.block_index = 6;
        chain.push(next);
        assert_eq!(validate_chain(&chain), Err(ValidationError::InvalidGenesis));
    }

    #[test]
    fn mined_blocks_extend_a_valid_chain() {
        let mut chain = mine_chain(3, 3);
        assert!(validate_chain(&chain).is_ok());

        let next = mine_next(&chain, vec![json!("tx-next")], 3);
        chain.push(next);
        assert_eq!(validate_chain(&chain), Ok(()));
    }

    #[test]
    fn validation_is_idempotent() {
        let chain = mine_chain(4, 2);
        let first = validate_chain(&chain);
        for _ in 0..5 {
            assert_eq!(validate_chain(&chain), first);
        }

        let mut broken = chain.clone();
        broken[2].nonce += 1;
        let first = validate_chain(&broken);
        assert!(first.is_err());
        assert_eq!(validate_chain(&broken), first);
    }

    #[test]
    fn tampered_data_is_detected() {
        let mut chain = mine_chain(4, 2);
        chain[2].data.push(json!("forged"));
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::HashMismatch { index: 2 })
        );
    }

    #[test]
    fn tampered_nonce_is_detected() {
        let mut chain = mine_chain(4, 2);
        chain[1].nonce = chain[1].nonce.wrapping_add(1);
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::HashMismatch { index: 1 })
        );
    }

    #[test]
    fn tampered_timestamp_is_detected() {
        let mut chain = mine_chain(4, 2);
        chain[3].timestamp += 1;
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::HashMismatch { index: 3 })
        );
    }

    #[test]
    fn tampered_previous_hash_is_detected() {
        let mut chain = mine_chain(4, 2);
        chain[2].previous_block_hash = "f".repeat(64);
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::BrokenLink { index: 2 })
        );
    }

    #[test]
    fn rehashed_tampering_breaks_the_next_link() {
        let mut chain = mine_chain(4, 2);
        chain[1].data = vec![json!("rewritten")];
        chain[1].current_block_hash = hash_block(
            chain[1].timestamp,
            &chain[1].previous_block_hash,
            &chain[1].data,
            chain[1].nonce,
            chain[1].difficulty,
        );
        let err = validate_chain(&chain).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InsufficientWork { index: 1, .. }
                | ValidationError::BrokenLink { index: 2 }
        ));
    }

    #[test]
    fn unmined_block_is_rejected() {
        let chain = mine_chain(2, 2);
        let prev = chain.last().unwrap();
        let data = vec![json!("lazy")];
        let difficulty = 8;

        // Pick a nonce whose hash is self-consistent but misses the target.
        let nonce = (0u64..)
            .find(|n| {
                let digest =
                    block_digest(5_000, &prev.current_block_hash, &data, *n, difficulty);
                !meets_difficulty(&digest, difficulty)
            })
            .unwrap();
        let block = Block {
            block_index: prev.block_index + 1,
            timestamp: 5_000,
            previous_block_hash: prev.current_block_hash.clone(),
            current_block_hash: hash_block(
                5_000,
                &prev.current_block_hash,
                &data,
                nonce,
                difficulty,
            ),
            data,
            nonce,
            difficulty,
        };

        let mut chain = chain;
        chain.push(block);
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::InsufficientWork { index: 2, difficulty: 8 })
        );
    }

    #[test]
    fn index_gap_is_rejected() {
        let chain = mine_chain(2, 2);
        let mut next = mine_next(&chain, vec![json!("tx")], 2);
        next.block_index += 1;
        let mut chain = chain;
        chain.push(next);
        assert_eq!(
            validate_chain(&chain),
            Err(ValidationError::IndexGap {
                index: 2,
                expected: 2,
                found: 3
            })
        );
    }
}
