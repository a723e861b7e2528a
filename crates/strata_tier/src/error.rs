// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::fmt;

/// Classifies why a cache operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The caller passed a key or value the cache cannot accept.
    InvalidArgument,
    /// The storage medium behind a backend could not be reached.
    BackendUnavailable,
    /// A single-assignment cache binding was bound a second time.
    CacheOverride,
    /// A resource namespace could not be derived from a request URL.
    MalformedUrl,
    /// The transport behind a request-caching policy failed.
    Transport,
    /// A value could not be converted to or from its stored form.
    Serialization,
    /// The storage medium rejected an operation after construction.
    Storage,
}

impl ErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid argument",
            Self::BackendUnavailable => "backend unavailable",
            Self::CacheOverride => "cache override",
            Self::MalformedUrl => "malformed url",
            Self::Transport => "transport error",
            Self::Serialization => "serialization error",
            Self::Storage => "storage error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a cache operation.
///
/// Every error carries an [`ErrorKind`]; the underlying cause, when there is one,
/// is reachable through [`std::error::Error::source()`] and is part of the
/// displayed message.
///
/// # Examples
///
/// ```
/// use strata_tier::{Error, ErrorKind};
///
/// let error = Error::invalid_argument("cache keys must not be empty");
/// assert_eq!(error.kind(), ErrorKind::InvalidArgument);
/// ```
#[ohno::error]
#[display("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind from any cause.
    pub fn with_kind(kind: ErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, cause)
    }

    /// Creates an [`ErrorKind::InvalidArgument`] error.
    pub fn invalid_argument(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::InvalidArgument, cause)
    }

    /// Creates an [`ErrorKind::BackendUnavailable`] error.
    pub fn backend_unavailable(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::BackendUnavailable, cause)
    }

    /// Creates an [`ErrorKind::CacheOverride`] error.
    pub fn cache_override(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::CacheOverride, cause)
    }

    /// Creates an [`ErrorKind::MalformedUrl`] error.
    pub fn malformed_url(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::MalformedUrl, cause)
    }

    /// Creates an [`ErrorKind::Transport`] error.
    pub fn transport(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Transport, cause)
    }

    /// Creates an [`ErrorKind::Serialization`] error.
    pub fn serialization(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Serialization, cause)
    }

    /// Creates an [`ErrorKind::Storage`] error.
    pub fn storage(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Storage, cause)
    }

    /// Returns what kind of failure this is.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
