use crate::core::context::Context;
use crate::domain::model::KeyInfo;
use crate::utils::error::Result;
use async_trait::async_trait;

/// The capability set the certificate manager stores through.
///
/// Keys are opaque; any hierarchy is the backend's business. All operations
/// honour the caller's [`Context`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Blocks until the lock for `key` is acquired or `ctx` fires.
    async fn lock(&self, ctx: &Context, key: &str) -> Result<()>;

    async fn unlock(&self, ctx: &Context, key: &str) -> Result<()>;

    async fn store(&self, ctx: &Context, key: &str, value: &[u8]) -> Result<()>;

    async fn load(&self, ctx: &Context, key: &str) -> Result<Vec<u8>>;

    async fn delete(&self, ctx: &Context, key: &str) -> Result<()>;

    /// There is no error channel: any failure reads as `false`.
    async fn exists(&self, ctx: &Context, key: &str) -> bool;

    async fn list(&self, ctx: &Context, prefix: &str, recursive: bool) -> Result<Vec<String>>;

    async fn stat(&self, ctx: &Context, key: &str) -> Result<KeyInfo>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends one JSON POST and hands back the raw status and body.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<TransportResponse>;
}
