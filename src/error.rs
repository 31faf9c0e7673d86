use std::io;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy shared by the codec, the router, and the reader.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller passed an empty, zero, or out-of-range value where
    /// forbidden. Raised at the boundary and never swallowed.
    #[error("invalid argument: {0}")]
    InvalidArg(&'static str),

    /// Bytes on the wire violate the grammar.
    #[error("malformed input: {reason}")]
    Format {
        /// What was violated.
        reason: String,
        /// The failure that triggered the wrap, when there was one.
        #[source]
        cause: Option<Box<Error>>,
    },

    /// Structural mismatch: header-compatible bytes that are not the
    /// identity literal, a wrong record count, or a formatter handed a
    /// detail variant it does not accept.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Propagated filesystem or stream failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Cooperative cancellation; always re-raised, never swallowed.
    #[error("cancelled")]
    Cancelled,

    /// An internal invariant was violated; indicates a bug.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl Error {
    /// A `Format` failure with no underlying cause.
    pub fn format(reason: impl Into<String>) -> Self {
        Error::Format {
            reason: reason.into(),
            cause: None,
        }
    }

    /// Wrap another failure as the cause of a `Format` failure.
    pub fn format_caused_by(reason: impl Into<String>, cause: Error) -> Self {
        Error::Format {
            reason: reason.into(),
            cause: Some(Box::new(cause)),
        }
    }
}
