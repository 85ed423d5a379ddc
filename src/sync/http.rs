use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::ChainSource;
use crate::api::models::ResponseModel;
use crate::blockchain::Chain;
use crate::error::{ChainError, FetchError, Result};

/// Fetches peer chains from `<peer>/api/v1/blockchain`.
#[derive(Clone)]
pub struct HttpChainSource {
    client: Client,
}

impl HttpChainSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::InvalidParameter(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    fn chain_url(peer: &str) -> String {
        format!("{}/api/v1/blockchain", peer.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChainSource for HttpChainSource {
    async fn fetch_chain(&self, peer: &str) -> std::result::Result<Chain, FetchError> {
        let resp = self.client.get(Self::chain_url(peer)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp.json::<ResponseModel<Chain>>().await?;
        Ok(body.data)
    }
}
