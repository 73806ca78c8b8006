use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use crate::diagnostics::Diagnostic;
use crate::state::StateDescriptionError;

/// Unified error type for the derivation engine.
#[derive(Debug)]
pub enum Error {
    /// A declaration could not be registered (malformed state description).
    State(StateDescriptionError),
    /// Batch-level resolution failure carrying the offending diagnostic.
    Resolve(Diagnostic),
    Internal {
        message: String,
        backtrace: Option<Backtrace>,
    },
}

/// Convenience result alias used across the engine.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Construct a new internal invariant violation.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: capture_backtrace(),
        }
    }

    /// Return the captured backtrace, if any.
    #[must_use]
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            Error::Internal { backtrace, .. } => backtrace.as_ref(),
            _ => None,
        }
    }
}

fn capture_backtrace() -> Option<Backtrace> {
    if cfg!(debug_assertions) {
        Some(Backtrace::force_capture())
    } else {
        None
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::State(err) => write!(f, "state description error: {err}"),
            Error::Resolve(diag) => write!(f, "resolution error: {diag}"),
            Error::Internal { message, .. } => write!(f, "internal error: {message}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::State(err) => Some(err),
            Error::Resolve(_) | Error::Internal { .. } => None,
        }
    }
}

impl From<StateDescriptionError> for Error {
    fn from(error: StateDescriptionError) -> Self {
        Error::State(error)
    }
}

impl From<Diagnostic> for Error {
    fn from(diagnostic: Diagnostic) -> Self {
        Error::Resolve(diagnostic)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::internal(message)
    }
}
