//! Error types for Reel.

use std::io;

use thiserror::Error;

use crate::Status;

/// Result type alias using Reel's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Reel.
///
/// Every failure names the operation that failed together with its status
/// code. A session that returns any of these has been torn down.
#[derive(Error, Debug)]
pub enum Error {
    /// Setup failed: the source could not be opened or understood, or the
    /// destination could not be created.
    #[error("{operation}: {status}")]
    Configuration { operation: String, status: Status },

    /// A queue, read, or write operation failed while rendering.
    #[error("{operation}: {status}")]
    Engine { operation: String, status: Status },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub fn configuration(operation: impl Into<String>, status: Status) -> Self {
        Self::Configuration {
            operation: operation.into(),
            status,
        }
    }

    pub fn engine(operation: impl Into<String>, status: Status) -> Self {
        Self::Engine {
            operation: operation.into(),
            status,
        }
    }

    /// Configuration error built from an I/O failure.
    pub fn configuration_io(operation: impl Into<String>, err: &io::Error) -> Self {
        Self::configuration(operation, Status::from_io(err))
    }

    /// Engine error built from an I/O failure.
    pub fn engine_io(operation: impl Into<String>, err: &io::Error) -> Self {
        Self::engine(operation, Status::from_io(err))
    }

    /// Name of the failed operation, if the error carries one.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::Configuration { operation, .. } | Self::Engine { operation, .. } => {
                Some(operation)
            }
            Self::InvalidArgument(_) => None,
        }
    }

    /// Status code of the failed operation, if the error carries one.
    pub const fn status(&self) -> Option<Status> {
        match self {
            Self::Configuration { status, .. } | Self::Engine { status, .. } => Some(*status),
            Self::InvalidArgument(_) => None,
        }
    }

    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub const fn is_engine(&self) -> bool {
        matches!(self, Self::Engine { .. })
    }
}
