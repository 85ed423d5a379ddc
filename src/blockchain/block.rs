use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{GENESIS_HASH, GENESIS_NONCE, GENESIS_PREVIOUS_HASH, MAX_DIFFICULTY};
use crate::error::{ChainError, Result};

/// A single committed block. `data` is opaque to consensus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub block_index: u64,
    pub timestamp: i64, // milliseconds since epoch (UTC)
    pub previous_block_hash: String,
    pub current_block_hash: String,
    pub data: Vec<Value>,
    pub nonce: u64,
    pub difficulty: u32,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis(timestamp: i64, difficulty: u32) -> Self {
        Self {
            block_index: 0,
            timestamp,
            previous_block_hash: GENESIS_PREVIOUS_HASH.to_string(),
            current_block_hash: GENESIS_HASH.to_string(),
            data: Vec::new(),
            nonce: GENESIS_NONCE,
            difficulty,
        }
    }
}

/// Assemble a block on top of `chain`. Its index is the chain length, so an
/// empty chain yields index 0.
pub fn create_block(
    chain: &[Block],
    timestamp: i64,
    previous_hash: &str,
    current_hash: &str,
    data: Vec<Value>,
    nonce: u64,
    difficulty: u32,
) -> Result<Block> {
    if difficulty > MAX_DIFFICULTY {
        return Err(ChainError::InvalidParameter(format!(
            "difficulty {difficulty} exceeds {MAX_DIFFICULTY}"
        )));
    }

    Ok(Block {
        block_index: chain.len() as u64,
        timestamp,
        previous_block_hash: previous_hash.to_string(),
        current_block_hash: current_hash.to_string(),
        data,
        nonce,
        difficulty,
    })
}

/// Parse a difficulty from configuration text. Negative, fractional or
/// out-of-range values are rejected.
pub fn parse_difficulty(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ChainError::InvalidParameter(format!("difficulty {trimmed:?} is not an integer")))?;
    if value < 0 || value > MAX_DIFFICULTY as i64 {
        return Err(ChainError::InvalidParameter(format!(
            "difficulty {value} outside 0..={MAX_DIFFICULTY}"
        )));
    }
    Ok(value as u32)
}

/// SHA-256 over the canonical preimage, as raw bytes.
pub fn block_digest(
    timestamp: i64,
    previous_hash: &str,
    data: &[Value],
    nonce: u64,
    difficulty: u32,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(preimage(timestamp, previous_hash, data, nonce, difficulty));
    hasher.finalize().into()
}

/// Hex-encoded SHA-256 of the block fields, in fixed order.
pub fn hash_block(
    timestamp: i64,
    previous_hash: &str,
    data: &[Value],
    nonce: u64,
    difficulty: u32,
) -> String {
    hex::encode(block_digest(timestamp, previous_hash, data, nonce, difficulty))
}

// A JSON array keeps field boundaries unambiguous. serde_json objects are
// BTreeMap-backed, so records serialize with sorted keys on every node.
fn preimage(
    timestamp: i64,
    previous_hash: &str,
    data: &[Value],
    nonce: u64,
    difficulty: u32,
) -> Vec<u8> {
    let fields = (timestamp, previous_hash, data, nonce, difficulty);
    serde_json::to_vec(&fields).expect("serialize block fields")
}
