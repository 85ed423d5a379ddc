use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, web};
use log::warn;

use super::chain::lock_writes;
use super::models::{AppState, ResponseModel, SyncResponse};
use crate::error::Result;
use crate::sync::synchronize_chain;

/// Run one synchronization round against the member nodes.
///
/// Peers are polled without the write lock. The swap happens under the lock
/// and only if the winning chain is still longer than what is stored.
#[get("/blockchain/consensus")]
pub async fn synchronize(state: web::Data<AppState>) -> Result<HttpResponse> {
    let local = state.store.read()?;
    let report = synchronize_chain(
        &local,
        &state.member_nodes,
        state.peers.as_ref(),
        state.peer_timeout,
    )
    .await;

    let (replaced, length) = match report.replaced() {
        Some(candidate) => {
            let _guard = lock_writes(&state)?;
            let current = state.store.read()?;
            if candidate.len() > current.len() {
                state.store.replace(candidate)?;
                (true, candidate.len())
            } else {
                warn!(
                    "SYNC - local chain grew to {} blocks during the round, keeping it",
                    current.len()
                );
                (false, current.len())
            }
        }
        None => (false, local.len()),
    };

    let resp = SyncResponse {
        message: if replaced {
            "Chain replaced by longer valid peer chain"
        } else {
            "In sync"
        },
        replaced,
        length,
        peers: report.peers,
    };
    Ok(HttpResponse::Ok().json(ResponseModel::new(StatusCode::OK, resp)))
}
