//! The storage adapter: each capability maps to one `POST <endpoint><operation>`.
//!
//! | Operation | Success | Not found |
//! |-----------|---------|-----------|
//! | lock      | 201     | (412 means held, poll again) |
//! | unlock    | 204     | 404       |
//! | store     | 201     |           |
//! | load      | 200     | 404       |
//! | delete    | 204     | 404       |
//! | exists    | 200     |           |
//! | list      | 200     | 404       |
//! | stat      | 200     | 404       |
//!
//! Any other status is [`StorageError::UnexpectedStatus`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::adapters::http::ReqwestTransport;
use crate::config::StorageConfig;
use crate::core::context::Context;
use crate::core::lock::LockPolicy;
use crate::core::wire::{
    ExistsResponse, KeyRequest, ListRequest, ListResponse, LoadResponse, Operation, StatResponse,
    StoreRequest,
};
use crate::domain::model::KeyInfo;
use crate::domain::ports::{Storage, Transport, TransportResponse};
use crate::utils::error::{Result, StorageError};
use crate::utils::validation::Validate;

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;
const STATUS_NO_CONTENT: u16 = 204;
const STATUS_NOT_FOUND: u16 = 404;
const STATUS_PRECONDITION_FAILED: u16 = 412;

/// Storage backed by a remote key-value service.
///
/// Holds no per-call state, so one instance can serve any number of
/// concurrent operations.
#[derive(Clone)]
pub struct RestStorage {
    endpoint: String,
    token: String,
    lock_policy: LockPolicy,
    transport: Arc<dyn Transport>,
}

impl RestStorage {
    /// Validates `config` and builds a reqwest transport from it.
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::from_validated(config, Arc::new(transport)))
    }

    /// Validates `config` and sends every request through `transport`.
    pub fn with_transport(config: StorageConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config, transport))
    }

    fn from_validated(config: StorageConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            lock_policy: config.lock.policy(),
            endpoint: config.endpoint,
            token: config.token,
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn lock_policy(&self) -> LockPolicy {
        self.lock_policy
    }

    fn operation_url(&self, operation: Operation) -> String {
        format!("{}{}", self.endpoint, operation)
    }

    fn key_request<'a>(&'a self, key: &'a str) -> KeyRequest<'a> {
        KeyRequest {
            key,
            token: &self.token,
        }
    }

    async fn send(
        &self,
        ctx: &Context,
        operation: Operation,
        payload: Vec<u8>,
    ) -> Result<TransportResponse> {
        let url = self.operation_url(operation);
        tracing::debug!(%operation, %url, "Sending storage request");

        let response = ctx.run(self.transport.post_json(&url, payload)).await?;

        tracing::debug!(%operation, status = response.status, "Storage response received");
        Ok(response)
    }

    /// Like [`Storage::exists`], but reports why the check failed.
    pub async fn try_exists(&self, ctx: &Context, key: &str) -> Result<bool> {
        let payload = encode(&self.key_request(key))?;
        let response = self.send(ctx, Operation::Exists, payload).await?;

        match response.status {
            STATUS_OK => Ok(decode::<ExistsResponse>(&response)?.exists),
            status => Err(StorageError::unexpected_status(Operation::Exists.as_str(), status)),
        }
    }
}

fn encode<T: Serialize>(request: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(request)?)
}

fn decode<T: DeserializeOwned>(response: &TransportResponse) -> Result<T> {
    Ok(serde_json::from_slice(&response.body)?)
}

fn unexpected(operation: Operation, status: u16) -> StorageError {
    StorageError::unexpected_status(operation.as_str(), status)
}

#[async_trait]
impl Storage for RestStorage {
    async fn lock(&self, ctx: &Context, key: &str) -> Result<()> {
        let payload = encode(&self.key_request(key))?;
        let mut backoff = self.lock_policy.backoff();
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            let response = self.send(ctx, Operation::Lock, payload.clone()).await?;

            match response.status {
                STATUS_CREATED => {
                    tracing::debug!(key, attempts, "Lock acquired");
                    return Ok(());
                }
                STATUS_PRECONDITION_FAILED => {
                    let delay = backoff.next_delay();
                    tracing::trace!(
                        key,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Lock is held elsewhere, polling again"
                    );
                    ctx.sleep(delay).await?;
                }
                status => return Err(unexpected(Operation::Lock, status)),
            }
        }
    }

    async fn unlock(&self, ctx: &Context, key: &str) -> Result<()> {
        let payload = encode(&self.key_request(key))?;
        let response = self.send(ctx, Operation::Unlock, payload).await?;

        match response.status {
            STATUS_NO_CONTENT => {
                tracing::debug!(key, "Lock released");
                Ok(())
            }
            STATUS_NOT_FOUND => Err(StorageError::not_found(key)),
            status => Err(unexpected(Operation::Unlock, status)),
        }
    }

    async fn store(&self, ctx: &Context, key: &str, value: &[u8]) -> Result<()> {
        let payload = encode(&StoreRequest::new(key, value, &self.token))?;
        let response = self.send(ctx, Operation::Store, payload).await?;

        match response.status {
            STATUS_CREATED => Ok(()),
            status => Err(unexpected(Operation::Store, status)),
        }
    }

    async fn load(&self, ctx: &Context, key: &str) -> Result<Vec<u8>> {
        let payload = encode(&self.key_request(key))?;
        let response = self.send(ctx, Operation::Load, payload).await?;

        match response.status {
            STATUS_OK => decode::<LoadResponse>(&response)?.into_bytes(),
            STATUS_NOT_FOUND => Err(StorageError::not_found(key)),
            status => Err(unexpected(Operation::Load, status)),
        }
    }

    async fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        let payload = encode(&self.key_request(key))?;
        let response = self.send(ctx, Operation::Delete, payload).await?;

        match response.status {
            STATUS_NO_CONTENT => Ok(()),
            STATUS_NOT_FOUND => Err(StorageError::not_found(key)),
            status => Err(unexpected(Operation::Delete, status)),
        }
    }

    async fn exists(&self, ctx: &Context, key: &str) -> bool {
        match self.try_exists(ctx, key).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(key, error = %e, "Existence check failed, reporting key as absent");
                false
            }
        }
    }

    async fn list(&self, ctx: &Context, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let payload = encode(&ListRequest {
            prefix,
            recursive,
            token: &self.token,
        })?;
        let response = self.send(ctx, Operation::List, payload).await?;

        match response.status {
            STATUS_OK => Ok(decode::<ListResponse>(&response)?.keys),
            STATUS_NOT_FOUND => Err(StorageError::not_found(prefix)),
            status => Err(unexpected(Operation::List, status)),
        }
    }

    async fn stat(&self, ctx: &Context, key: &str) -> Result<KeyInfo> {
        let payload = encode(&self.key_request(key))?;
        let response = self.send(ctx, Operation::Stat, payload).await?;

        match response.status {
            STATUS_OK => KeyInfo::try_from(decode::<StatResponse>(&response)?),
            STATUS_NOT_FOUND => Err(StorageError::not_found(key)),
            status => Err(unexpected(Operation::Stat, status)),
        }
    }
}

impl fmt::Debug for RestStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestStorage")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("lock_policy", &self.lock_policy)
            .finish_non_exhaustive()
    }
}
