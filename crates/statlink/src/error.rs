// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// Result type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The remote service or the network failed. Never retried by this crate.
    Transport,
    /// The request is malformed, e.g. a key that does not fit the structure.
    InvalidArgument,
    /// The requested flow, structure, source or driver does not exist.
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transport => "transport error",
            Self::InvalidArgument => "invalid argument",
            Self::NotFound => "not found",
        })
    }
}

/// Error returned by clients, connections and the manager.
///
/// Cache storage failures never surface as an `Error`; they only make the cache miss.
#[ohno::error]
#[display("{kind}: {detail}")]
pub struct Error {
    kind: ErrorKind,
    detail: String,
}

impl Error {
    /// A failure of the remote service or of the network.
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, detail)
    }

    /// A transport failure caused by a lower-level error.
    pub fn transport_caused_by(detail: impl Into<String>, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Transport, detail, cause)
    }

    /// A malformed request.
    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, detail)
    }

    /// A missing resource.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, detail)
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the description given when the error was created.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

#[cfg(test)]
mod tests {
    use ohno::ErrorExt;

    use super::*;

    #[test]
    fn message_names_kind_and_detail() {
        let error = Error::invalid_argument("key has 3 dimensions, expected 5");
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert_eq!(error.message(), "invalid argument: key has 3 dimensions, expected 5");
    }

    #[test]
    fn transport_error_keeps_its_cause() {
        let error = Error::transport_caused_by("GET /dataflow failed", "connection reset");
        assert_eq!(error.kind(), ErrorKind::Transport);
        assert!(error.message().contains("connection reset"), "{}", error.message());
    }
}
