//! Storage for TLS certificates, keys and account metadata kept in a remote
//! key-value service reachable over HTTP(S).
//!
//! [`RestStorage`] implements the [`Storage`] capability set (store, load,
//! delete, exists, list, stat, lock, unlock). Locks are held by the remote
//! service; `lock` polls until it is granted or the caller's [`Context`]
//! fires.

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{http::ReqwestTransport, rest::RestStorage};
pub use config::{LockConfig, StorageConfig};
pub use self::core::{CancelHandle, CancelReason, Context, LockPolicy};
pub use domain::model::KeyInfo;
pub use domain::ports::{Storage, Transport, TransportResponse};
pub use utils::error::{ErrorKind, Result, StorageError};
