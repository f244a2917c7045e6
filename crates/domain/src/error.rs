//! Domain error classification.

use serde::Serialize;

/// Coarse classification of a domain failure.
///
/// The HTTP boundary switches on this value to choose a status code, so the
/// human-readable message of an error never influences how it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller is authenticated but lacks the required role or identity.
    Authorization,
    /// Missing or malformed input.
    Validation,
    /// The addressed record does not exist.
    NotFound,
    /// The record is in a state that does not allow the requested transition.
    InvalidState,
    /// The backing store could not be reached; the request may be retried.
    Transient,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Whether a client may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}
