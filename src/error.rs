//! Cache error types

/// Cache-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    #[error("Cache has been disposed")]
    ObjectDisposed,

    #[error("Cached value for key `{key}` is not a `{expected}`")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("Store error: {0}")]
    Store(String),
}

impl CacheError {
    pub(crate) fn blank(name: &'static str) -> Self {
        Self::InvalidArgument {
            name,
            reason: "value cannot be empty or whitespace",
        }
    }

    /// Whether this error reports a rejected argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
