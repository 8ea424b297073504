//! Crate-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::{RpcError, TransportError};
use crate::utils::StorageError;

/// Any failure surfaced to the binary or a library consumer
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
