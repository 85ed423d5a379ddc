//! Chain builders shared by unit tests.

use serde_json::{Value, json};

use super::block::{Block, create_block};
use super::pow::{DifficultyPolicy, proof_of_work_at};

pub const GENESIS_TIMESTAMP: i64 = 1_700_000_000_000;

/// Mine one block on top of `chain` at a fixed difficulty.
pub fn mine_next(chain: &[Block], data: Vec<Value>, difficulty: u32) -> Block {
    let last = chain.last().expect("chain has a tip");
    let timestamp = last.timestamp + 1_000;
    let proof = proof_of_work_at(
        last,
        &last.current_block_hash,
        &data,
        &DifficultyPolicy::Fixed(difficulty),
        timestamp,
    );
    create_block(
        chain,
        proof.timestamp,
        &last.current_block_hash,
        &proof.hash,
        data,
        proof.nonce,
        proof.difficulty,
    )
    .expect("valid difficulty")
}

/// A valid chain of `len` blocks, genesis included.
pub fn mine_chain(len: usize, difficulty: u32) -> Vec<Block> {
    mine_chain_tagged(len, difficulty, "tx")
}

/// Like [`mine_chain`], with block data tagged so that chains of the same
/// length from different "peers" differ.
pub fn mine_chain_tagged(len: usize, difficulty: u32, tag: &str) -> Vec<Block> {
    let mut chain = vec![Block::genesis(GENESIS_TIMESTAMP, difficulty)];
    while chain.len() < len {
        let data = vec![json!(format!("{tag}-{}", chain.len()))];
        let block = mine_next(&chain, data, difficulty);
        chain.push(block);
    }
    chain
}
