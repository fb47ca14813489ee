//! HTTP transport backed by a pooled `reqwest` client

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::service::{RequestError, Transport};
use crate::scenario::PreparedRequest;

/// Maximum idle connections kept per host in the pool
const POOL_MAX_IDLE_PER_HOST: usize = 256;

pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RequestError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RequestError::InvalidUrl(base_url));
        }

        let client = Client::builder()
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .timeout(timeout)
            .user_agent(concat!("kronos-loadgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RequestError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &PreparedRequest) -> String {
        format!("{}{}", self.base_url, request.path_and_query)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<u16, RequestError> {
        let url = self.url_for(request);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                RequestError::Timeout(self.timeout)
            } else {
                RequestError::Network(e.to_string())
            }
        })?;

        let status = resp.status().as_u16();
        // Drain the body so the connection returns to the pool
        if let Err(e) = resp.bytes().await {
            debug!("Failed to read body from {}: {}", url, e);
        }
        Ok(status)
    }
}
