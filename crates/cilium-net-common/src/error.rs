//! Shared error type across cilium-net crates.

use thiserror::Error;

use crate::ipam::IpamType;

/// Stable error kinds, matchable without looking at message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lookup by id/uuid/digest/path failed.
    NotFound,
    /// Endpoint id already registered.
    DuplicateEndpoint,
    /// Malformed policy path.
    InvalidPath,
    /// Identity UUID space exhausted.
    AllocationError,
    /// Caller bookkeeping bug (e.g. double release).
    InvariantViolation,
    /// Unknown IPAM type.
    UnsupportedBackend,
    /// Opaque failure from an IPAM backend or the dataplane.
    BackendError,
    /// Bad configuration value.
    InvalidConfig,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Process plumbing failure.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::DuplicateEndpoint => "DUPLICATE_ENDPOINT",
            ErrorKind::InvalidPath => "INVALID_PATH",
            ErrorKind::AllocationError => "ALLOCATION_ERROR",
            ErrorKind::InvariantViolation => "INVARIANT_VIOLATION",
            ErrorKind::UnsupportedBackend => "UNSUPPORTED_BACKEND",
            ErrorKind::BackendError => "BACKEND_ERROR",
            ErrorKind::InvalidConfig => "INVALID_CONFIG",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// What a `NotFound` lookup was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Identity(u32),
    Digest(String),
    Endpoint(String),
    PolicyPath(String),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Identity(id) => write!(f, "identity {id}"),
            Missing::Digest(d) => write!(f, "identity with digest {d}"),
            Missing::Endpoint(id) => write!(f, "endpoint {id}"),
            Missing::PolicyPath(p) => write!(f, "policy node {p}"),
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type used by the common types and the daemon.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(Missing),
    #[error("endpoint {0} already exists")]
    DuplicateEndpoint(String),
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("identity space exhausted (max id {max})")]
    AllocationError { max: u32 },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("unsupported IPAM backend: {0}")]
    UnsupportedBackend(IpamType),
    /// Backend message, carried verbatim.
    #[error("{0}")]
    Backend(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a backend or dataplane failure without reinterpreting it.
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    pub fn invalid_path(path: &str, reason: &'static str) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }

    /// Map to a stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::DuplicateEndpoint(_) => ErrorKind::DuplicateEndpoint,
            Error::InvalidPath { .. } => ErrorKind::InvalidPath,
            Error::AllocationError { .. } => ErrorKind::AllocationError,
            Error::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Error::UnsupportedBackend(_) => ErrorKind::UnsupportedBackend,
            Error::Backend(_) => ErrorKind::BackendError,
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Error::UnsupportedVersion => ErrorKind::UnsupportedVersion,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
