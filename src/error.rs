//! Error types for stream operations.
//!
//! Two families of error live here:
//!
//! - [`UsageError`] is returned synchronously when an API is called with
//!   malformed input (for example a bare closure passed to `subscribe`).
//! - [`StreamError`] is the value that travels along a stream's error channel.
//!   It is cheap to clone so a single error can be delivered to every listener.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias used by handlers, predicates and transforms.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

/// Errors raised at the call site when the API is misused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// An argument had the wrong shape
    #[error("{reason}")]
    InvalidArgument {
        /// Why the argument was rejected
        reason: &'static str,
    },
}

/// What a [`StreamError`] carries
#[derive(Error, Debug)]
pub enum StreamErrorKind {
    /// A plain message raised by a producer or handler
    #[error("{0}")]
    Message(String),

    /// Any other error type converted into a stream error
    #[error(transparent)]
    Source(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Every producer went away before a one-shot bridge could settle
    #[error("stream dropped before the promise settled")]
    Closed,
}

/// An error travelling along a stream's error channel.
///
/// Cloning shares the underlying error, so the same value reaches every
/// listener. Two clones of one error are identical under [`StreamError::ptr_eq`].
#[derive(Clone)]
pub struct StreamError {
    inner: Arc<StreamErrorKind>,
}

impl StreamError {
    /// Creates a stream error from a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::from_kind(StreamErrorKind::Message(message.to_string()))
    }

    /// Creates the error a bridge resolves with when its source is gone.
    pub fn closed() -> Self {
        Self::from_kind(StreamErrorKind::Closed)
    }

    fn from_kind(kind: StreamErrorKind) -> Self {
        Self {
            inner: Arc::new(kind),
        }
    }

    /// Returns what this error carries.
    pub fn kind(&self) -> &StreamErrorKind {
        &self.inner
    }

    /// Returns true if this error was produced by a dropped source.
    pub fn is_closed(&self) -> bool {
        matches!(*self.inner, StreamErrorKind::Closed)
    }

    /// Attempts to view the wrapped error as a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match &*self.inner {
            StreamErrorKind::Source(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns true if both values are clones of the same error.
    pub fn ptr_eq(&self, other: &StreamError) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl fmt::Debug for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamError").field(&*self.inner).finish()
    }
}

impl<E> From<E> for StreamError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::from_kind(StreamErrorKind::Source(Box::new(error)))
    }
}
