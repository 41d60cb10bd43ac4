pub mod context;
pub mod lock;
pub mod wire;

pub use crate::domain::model::KeyInfo;
pub use crate::domain::ports::{Storage, Transport, TransportResponse};
pub use crate::utils::error::Result;
pub use context::{CancelHandle, CancelReason, Context};
pub use lock::LockPolicy;
