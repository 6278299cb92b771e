//! Error types carried by fallible deferred values.

use std::sync::Arc;

use thiserror::Error as ThisError;

/// The failure branch of a fallible deferred value.
///
/// Errors are opaque to the core: they are produced by producer blocks or
/// chained transforms and forwarded untouched to whoever observes them.
/// `Error` is cheap to clone so every observer receives its own copy.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// Any error produced by application code.
    #[error(transparent)]
    Other(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// Ad-hoc error with a message.
    #[error("{0}")]
    Message(String),

    /// The producing side went away without settling.
    #[error("promise cancelled")]
    Cancelled,

    /// A channel being observed closed before delivering a message.
    #[error("channel closed")]
    ChannelClosed,
}

impl Error {
    /// Wrap any error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(Arc::new(error))
    }

    /// Create an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    /// Borrow the wrapped error as `E`, if that is what it is.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Error::Other(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
