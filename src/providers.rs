pub mod aws;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by a `CloudApi` implementation.
///
/// SECURITY: Error messages must NEVER contain sensitive data like secret
/// keys or session tokens.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed (invalid or rejected credentials)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The provider returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider returned a response the client could not interpret
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

/// Read/write capability over the cloud provider.
///
/// The dispatch and teardown core only ever talks to this trait, so it can be
/// exercised against an in-memory double. `query` never changes provider
/// state; `mutate` is only ever issued in destructive mode.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Every resource visible to tagging enumeration, as locator strings.
    /// Pagination is handled internally and exposed as one flat list.
    async fn list_tagged_resources(&self) -> Result<Vec<String>, ApiError>;

    /// Read-side call, keyed by (service, action).
    async fn query(&self, service: &str, action: &str, params: Value) -> Result<Value, ApiError>;

    /// Write-side call, keyed by (service, action).
    async fn mutate(&self, service: &str, action: &str, params: Value) -> Result<Value, ApiError>;

    fn region(&self) -> &str;
}
