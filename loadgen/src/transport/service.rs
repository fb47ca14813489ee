//! Transport trait definition

use async_trait::async_trait;
use thiserror::Error;

use crate::scenario::PreparedRequest;

/// Errors that prevent a request from producing a response
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Trait for issuing scenario requests (HTTP in production, doubles in tests)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the response status code
    async fn send(&self, request: &PreparedRequest) -> Result<u16, RequestError>;
}
