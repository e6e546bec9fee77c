//! HTTP transport seam. Adapters depend on `HttpApi` only; the reqwest
//! implementation lives here so tests can substitute canned responses.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::shared::errors::FetchError;

/// Injected fetch capability: one parsed-JSON result or one failure per call.
/// `call` is a short human-readable name used in error messages so multi-call
/// adapters can say which request failed.
#[async_trait]
pub trait HttpApi: Send + Sync {
    async fn get_json(&self, call: &str, url: &str) -> Result<Value, FetchError>;
}

/// reqwest-backed implementation. No retries and no caching; a failed call is
/// reported as failed for this run.
pub struct ReqwestApi {
    client: Client,
}

impl ReqwestApi {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpApi for ReqwestApi {
    async fn get_json(&self, call: &str, url: &str) -> Result<Value, FetchError> {
        info!("🔍 Fetching {} from: {}", call, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                call: call.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("⚠️ {} returned status: {}", call, status);
            return Err(FetchError::ApiStatus {
                call: call.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            warn!("⚠️ {} returned unparseable body: {}", call, e);
            FetchError::malformed(call, e.to_string())
        })
    }
}
