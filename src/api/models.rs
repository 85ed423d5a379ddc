use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::blockchain::DifficultyPolicy;
use crate::storage::ChainStore;
use crate::sync::{ChainSource, PeerReport};

/// Shared application state. The chain itself lives in the store; the
/// write lock serializes appends and replacements.
pub struct AppState {
    pub store: ChainStore,
    pub write_lock: Mutex<()>,
    pub policy: DifficultyPolicy,
    pub member_nodes: Vec<String>,
    pub peer_timeout: Duration,
    pub peers: Arc<dyn ChainSource>,
}

/* ---------- Response envelopes ---------- */

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseModel<T> {
    pub success: bool,
    pub status_code: u16,
    pub data: T,
}

impl<T> ResponseModel<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            success: true,
            status_code: status.as_u16(),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub status_code: u16,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: String) -> Self {
        Self {
            success: false,
            status_code: status.as_u16(),
            error,
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub message: &'static str,
    pub replaced: bool,
    pub length: usize,
    pub peers: Vec<PeerReport>,
}
