//! Error types shared by every Riffle crate.

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong inside the engine.
///
/// Parse and validation errors are reported back to the caller and leave the
/// store untouched. Inconsistency and exhaustion are fatal to the query that
/// observed them; commit atomicity keeps the store consistent.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed query text. The query is rejected before planning.
    #[error("parse error: {message}")]
    Parse {
        /// What the parser could not accept.
        message: String,
    },

    /// A structurally valid query that references something undeclared or
    /// requests an unsupported combination. Detected at plan time; no
    /// partial plan is returned.
    #[error("validation error: {message}")]
    Validation {
        /// What failed validation.
        message: String,
    },

    /// A type string was looked up during planning but never interned.
    #[error("no type named {name:?} exists")]
    NoSuchType {
        /// The offending type name.
        name: String,
    },

    /// A plan with zero stages; construction rejects this.
    #[error("query plan has no stages")]
    EmptyPlan,

    /// Identifier space exhausted.
    #[error("resource exhausted: {message}")]
    Exhaustion {
        /// What ran out.
        message: String,
    },

    /// The forward/backward adjacency mirror invariant was violated.
    #[error("graph inconsistency: {message}")]
    Inconsistency {
        /// Which vertices disagree.
        message: String,
    },

    /// Output sink I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with a formatted message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Parse`] with a formatted message.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
        }
    }
}
