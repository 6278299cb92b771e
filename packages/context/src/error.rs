//! Error types for the context layer.

use thiserror::Error;

/// Errors that can occur while setting up execution contexts.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The tokio runtime could not be built.
    #[error("failed to build runtime: {0}")]
    RuntimeBuild(#[from] std::io::Error),

    /// A process-wide dispatcher is already in place.
    #[error("dispatcher already installed")]
    AlreadyInstalled,
}
