use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::api::models::ErrorResponse;

/// Errors surfaced by the node.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("chain is not adoptable: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("chain tip moved: expected previous hash {expected}, tip is {actual}")]
    StaleTip { expected: String, actual: String },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("mining failed: {0}")]
    Mining(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// The first check a chain failed. Indices refer to the offending block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("chain is empty")]
    EmptyChain,

    #[error("genesis block must have index 0 and the sentinel previous hash")]
    InvalidGenesis,

    #[error("block {index} does not link to its predecessor")]
    BrokenLink { index: usize },

    #[error("block {index} stored hash does not match its contents")]
    HashMismatch { index: usize },

    #[error("block {index} hash does not satisfy difficulty {difficulty}")]
    InsufficientWork { index: usize, difficulty: u32 },

    #[error("block {index} has blockIndex {found}, expected {expected}")]
    IndexGap {
        index: usize,
        expected: u64,
        found: u64,
    },
}

/// Failure to obtain a chain from one peer. Never fatal to a sync round.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("peer answered with status {0}")]
    Status(u16),

    #[error("no answer within {0} ms")]
    Timeout(u128),

    #[error("could not decode peer chain: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl ResponseError for ChainError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChainError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ChainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ChainError::NotFound(_) => StatusCode::NOT_FOUND,
            ChainError::StaleTip { .. } => StatusCode::CONFLICT,
            ChainError::Storage(_) | ChainError::Serialization(_) | ChainError::Mining(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse::new(status, self.to_string()))
    }
}
