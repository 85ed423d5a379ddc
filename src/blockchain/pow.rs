use chrono::Utc;
use log::debug;
use serde_json::Value;

use super::block::{Block, block_digest};
use super::{DEFAULT_MINE_RATE_MS, DIFF_MAX, DIFF_MIN, MAX_DIFFICULTY};
use crate::error::{ChainError, Result};

/// How the difficulty of the next block is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyPolicy {
    /// Every block is mined at the same difficulty.
    Fixed(u32),
    /// Step the last block's difficulty up when blocks arrive faster than
    /// `mine_rate_ms`, down otherwise, clamped to `[min, max]`.
    Retarget { mine_rate_ms: i64, min: u32, max: u32 },
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        DifficultyPolicy::Retarget {
            mine_rate_ms: DEFAULT_MINE_RATE_MS,
            min: DIFF_MIN,
            max: DIFF_MAX,
        }
    }
}

impl DifficultyPolicy {
    /// Reject policies that could ask for an unsatisfiable difficulty.
    pub fn validated(self) -> Result<Self> {
        match self {
            DifficultyPolicy::Fixed(d) if d > MAX_DIFFICULTY => Err(ChainError::InvalidParameter(
                format!("difficulty {d} exceeds {MAX_DIFFICULTY}"),
            )),
            DifficultyPolicy::Retarget { mine_rate_ms, min, max } => {
                if mine_rate_ms <= 0 {
                    return Err(ChainError::InvalidParameter(
                        "mine rate must be positive".into(),
                    ));
                }
                if min > max || max > MAX_DIFFICULTY {
                    return Err(ChainError::InvalidParameter(format!(
                        "difficulty bounds {min}..={max} are not within 0..={MAX_DIFFICULTY}"
                    )));
                }
                Ok(self)
            }
            fixed => Ok(fixed),
        }
    }

    /// Difficulty for a block stamped `timestamp` that follows `last`.
    pub fn next_difficulty(&self, last: &Block, timestamp: i64) -> u32 {
        match *self {
            DifficultyPolicy::Fixed(d) => d,
            DifficultyPolicy::Retarget { mine_rate_ms, min, max } => {
                let adjusted = if last.timestamp.saturating_add(mine_rate_ms) > timestamp {
                    last.difficulty.saturating_add(1)
                } else {
                    last.difficulty.saturating_sub(1)
                };
                adjusted.clamp(min, max)
            }
        }
    }
}

/// Result of a successful nonce search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedProof {
    pub nonce: u64,
    pub difficulty: u32,
    pub timestamp: i64,
    pub hash: String,
}

/// Number of leading zero bits in a digest.
pub fn leading_zero_bits(digest: &[u8]) -> u32 {
    let mut bits = 0;
    for byte in digest {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

/// The proof-of-work predicate, shared by mining and validation.
pub fn meets_difficulty(digest: &[u8; 32], difficulty: u32) -> bool {
    difficulty <= MAX_DIFFICULTY && leading_zero_bits(digest) >= difficulty
}

/// Mine on top of `last_block`, stamping the block with the current time.
pub fn proof_of_work(
    last_block: &Block,
    previous_hash: &str,
    data: &[Value],
    policy: &DifficultyPolicy,
) -> MinedProof {
    proof_of_work_at(
        last_block,
        previous_hash,
        data,
        policy,
        Utc::now().timestamp_millis(),
    )
}

/// Search nonces from zero until the block hash meets the difficulty chosen
/// for `timestamp`. Timestamp and difficulty stay fixed for the whole search.
///
/// The search is unbounded; callers keep the policy ceiling sane.
pub fn proof_of_work_at(
    last_block: &Block,
    previous_hash: &str,
    data: &[Value],
    policy: &DifficultyPolicy,
    timestamp: i64,
) -> MinedProof {
    let difficulty = policy.next_difficulty(last_block, timestamp);
    let mut nonce: u64 = 0;
    loop {
        let digest = block_digest(timestamp, previous_hash, data, nonce, difficulty);
        if meets_difficulty(&digest, difficulty) {
            debug!(
                "MINER - solved height {} at difficulty {} after {} attempts",
                last_block.block_index + 1,
                difficulty,
                nonce.saturating_add(1)
            );
            return MinedProof {
                nonce,
                difficulty,
                timestamp,
                hash: hex::encode(digest),
            };
        }
        nonce = nonce.wrapping_add(1);
    }
}
