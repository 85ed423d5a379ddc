use std::sync::MutexGuard;
use std::time::Instant;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, post, web};
use log::{debug, info};
use serde_json::Value;

use super::models::{AppState, ResponseModel, ValidateResponse};
use crate::blockchain::{create_block, hash_block, proof_of_work, validate_chain};
use crate::error::{ChainError, Result};

pub(super) fn lock_writes(state: &AppState) -> Result<MutexGuard<'_, ()>> {
    state
        .write_lock
        .lock()
        .map_err(|_| ChainError::Storage(std::io::Error::other("chain write lock poisoned")))
}

/// Get the full blockchain.
#[get("/blockchain")]
pub async fn get_blockchain(state: web::Data<AppState>) -> Result<HttpResponse> {
    let chain = state.store.read()?;
    Ok(HttpResponse::Ok().json(ResponseModel::new(StatusCode::OK, chain)))
}

/// Mine a block holding the request body and append it to the chain.
///
/// A JSON array body is the record sequence; any other value becomes a
/// single record. The nonce search runs on the blocking pool without the
/// write lock; the append then checks that the tip has not moved.
#[post("/blockchain/mine")]
pub async fn mine_block(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let data = match body.into_inner() {
        Value::Array(records) => records,
        other => vec![other],
    };

    let chain = state.store.read()?;
    let last = chain
        .last()
        .cloned()
        .ok_or_else(|| ChainError::NotFound("No blockchain available".into()))?;
    let policy = state.policy;
    debug!(
        "MINER - mining height {} with {} records",
        chain.len(),
        data.len()
    );

    let t0 = Instant::now();
    let (last, data, proof) = web::block(move || {
        let proof = proof_of_work(&last, &last.current_block_hash, &data, &policy);
        (last, data, proof)
    })
    .await
    .map_err(|e| ChainError::Mining(e.to_string()))?;

    let current_hash = hash_block(
        proof.timestamp,
        &last.current_block_hash,
        &data,
        proof.nonce,
        proof.difficulty,
    );
    let block = create_block(
        &chain,
        proof.timestamp,
        &last.current_block_hash,
        &current_hash,
        data,
        proof.nonce,
        proof.difficulty,
    )?;

    {
        let _guard = lock_writes(&state)?;
        state.store.append(block.clone())?;
    }

    info!(
        "MINER - sealed block #{} (hash={}, nonce={}, difficulty={}) in {} ms",
        block.block_index,
        block.current_block_hash,
        block.nonce,
        block.difficulty,
        t0.elapsed().as_millis()
    );
    Ok(HttpResponse::Created().json(ResponseModel::new(StatusCode::CREATED, block)))
}

/// Validate the whole local chain.
#[get("/blockchain/validate")]
pub async fn validate_local_chain(state: web::Data<AppState>) -> Result<HttpResponse> {
    let chain = state.store.read()?;
    let result = validate_chain(&chain);
    let resp = ValidateResponse {
        valid: result.is_ok(),
        length: chain.len(),
        reason: result.err().map(|e| e.to_string()),
    };
    Ok(HttpResponse::Ok().json(ResponseModel::new(StatusCode::OK, resp)))
}

/// Get a single block by its index.
#[get("/blockchain/{index}")]
pub async fn get_block_by_index(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse> {
    let index = path.into_inner();
    let chain = state.store.read()?;
    let block = chain
        .into_iter()
        .find(|b| b.block_index == index)
        .ok_or_else(|| ChainError::NotFound(format!("Unable to find block with index: {index}")))?;
    Ok(HttpResponse::Ok().json(ResponseModel::new(StatusCode::OK, block)))
}
