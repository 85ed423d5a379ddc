//! Longest-valid-chain synchronization against the member nodes.
//!
//! A round fans out one fetch per peer, waits for every fetch to finish or
//! time out, and only then applies fork choice over the complete result set.

mod http;

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::blockchain::{Block, Chain, validate_chain};
use crate::error::{FetchError, ValidationError};

pub use http::HttpChainSource;

/// Read-only access to a peer's full chain.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch_chain(&self, peer: &str) -> Result<Chain, FetchError>;
}

/// What happened to one peer during a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "camelCase")]
pub enum PeerVerdict {
    /// Fetch failed or timed out; skipped this round.
    Unreachable { reason: String },
    /// Not longer than the local chain.
    NotLonger { length: usize },
    /// Longer, but failed validation.
    Rejected { length: usize, reason: String },
    /// Longer and valid, but another candidate won.
    Candidate { length: usize },
    /// The chain that replaced the local one.
    Adopted { length: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerReport {
    pub peer: String,
    #[serde(flatten)]
    pub verdict: PeerVerdict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    NoChange,
    Replaced(Chain),
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub peers: Vec<PeerReport>,
}

impl SyncReport {
    pub fn replaced(&self) -> Option<&Chain> {
        match &self.outcome {
            SyncOutcome::Replaced(chain) => Some(chain),
            SyncOutcome::NoChange => None,
        }
    }
}

/// Query every peer concurrently, each bounded by `timeout`, and pick the
/// longest valid chain strictly longer than `local`.
///
/// The local chain is never touched here; the caller performs the swap.
pub async fn synchronize_chain<S>(
    local: &[Block],
    peers: &[String],
    source: &S,
    timeout: Duration,
) -> SyncReport
where
    S: ChainSource + ?Sized,
{
    let fetches = peers.iter().map(|peer| async move {
        let result = match tokio::time::timeout(timeout, source.fetch_chain(peer)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout.as_millis())),
        };
        (peer.clone(), result)
    });

    // Barrier: fork choice only runs once every peer has answered or timed out.
    let responses = join_all(fetches).await;
    debug!("SYNC - collected {} peer responses", responses.len());

    // Validation hashes every block of every longer candidate; keep it off
    // the async workers.
    let local_len = local.len();
    match tokio::task::spawn_blocking(move || choose_chain(local_len, responses)).await {
        Ok(report) => report,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            error!("SYNC - fork choice task failed: {e}");
            SyncReport {
                outcome: SyncOutcome::NoChange,
                peers: Vec::new(),
            }
        }
    }
}

/// Fork choice over a complete set of peer responses, in peer order.
///
/// Ties between equally long valid chains go to the first peer listed.
pub fn choose_chain(
    local_len: usize,
    responses: Vec<(String, Result<Chain, FetchError>)>,
) -> SyncReport {
    let mut peers = Vec::with_capacity(responses.len());
    let mut best: Option<(usize, Chain)> = None;

    for (peer, result) in responses {
        let verdict = match result {
            Err(e) => {
                warn!("SYNC - skipping {peer}: {e}");
                PeerVerdict::Unreachable {
                    reason: e.to_string(),
                }
            }
            Ok(chain) if chain.len() <= local_len => {
                debug!(
                    "SYNC - {peer} has {} blocks, local has {local_len}",
                    chain.len()
                );
                PeerVerdict::NotLonger {
                    length: chain.len(),
                }
            }
            Ok(chain) => match validate_chain(&chain) {
                Err(e) => {
                    warn!("SYNC - rejecting chain from {peer}: {e}");
                    rejected(chain.len(), e)
                }
                Ok(()) => {
                    let length = chain.len();
                    let better = best
                        .as_ref()
                        .is_none_or(|(_, current)| length > current.len());
                    if better {
                        best = Some((peers.len(), chain));
                    }
                    PeerVerdict::Candidate { length }
                }
            },
        };
        peers.push(PeerReport { peer, verdict });
    }

    let outcome = match best {
        Some((slot, chain)) => {
            let length = chain.len();
            peers[slot].verdict = PeerVerdict::Adopted { length };
            info!(
                "SYNC - adopting chain of {length} blocks from {} (local had {local_len})",
                peers[slot].peer
            );
            SyncOutcome::Replaced(chain)
        }
        None => {
            info!("SYNC - in sync, keeping local chain of {local_len} blocks");
            SyncOutcome::NoChange
        }
    };

    SyncReport { outcome, peers }
}

fn rejected(length: usize, err: ValidationError) -> PeerVerdict {
    PeerVerdict::Rejected {
        length,
        reason: err.to_string(),
    }
}
