pub mod block;
pub mod pow;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use block::{Block, create_block, hash_block, parse_difficulty};
pub use pow::{DifficultyPolicy, proof_of_work};
pub use validation::validate_chain;

/// An ordered, hash-linked sequence of blocks, genesis first.
pub type Chain = Vec<Block>;

/// Previous hash carried by every genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Stored hash of every genesis block. It is never recomputed, so genesis
/// blocks created at different times on different nodes are interchangeable.
pub const GENESIS_HASH: &str = "0";

/// Nonce recorded in the genesis block.
pub const GENESIS_NONCE: u64 = 1337;

/// Default difficulty of the genesis block (leading zero bits).
pub const DEFAULT_GENESIS_DIFFICULTY: u32 = 2;

/// A SHA-256 digest cannot have more leading zero bits than this.
pub const MAX_DIFFICULTY: u32 = 256;

/// Target milliseconds per block for retargeting.
pub const DEFAULT_MINE_RATE_MS: i64 = 1000;

/// Retarget bounds (keep low in dev to avoid long waits).
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 24;
