//! Error types for the parameter cache.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the parameter cache.
///
/// All operations return `Result<T>` where `Result` is defined as
/// `std::result::Result<T, Error>`. Errors always propagate to the caller;
/// the only place the crate catches anything is the
/// [`RefreshOnError`](crate::retry::RefreshOnError) wrapper, and even there
/// only the first attempt's designated error class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One or more names could not be resolved by the backing store.
    ///
    /// Carries the offending name, or every unresolved name of a batch
    /// joined with `,`. Also raised when a secret name collides with the
    /// parameter store's own absolute-path namespace.
    ///
    /// **Recovery:** Check the name against the remote store; a batch
    /// refresh that fails this way has left previously cached values
    /// untouched.
    InvalidParameter(String),

    /// A `:version` suffix on a parameter name did not parse as a
    /// positive integer.
    ///
    /// Raised at construction time, before any network traffic.
    InvalidVersion(String),

    /// A hierarchical path argument does not start with `/`.
    ///
    /// Raised by path-taking operations and by base-path configuration.
    InvalidPath(String),

    /// Configuration error during setup.
    ///
    /// Common causes:
    /// - Empty parameter name
    /// - Invalid filter key/option combination
    /// - More than the allowed number of filter values
    ConfigError(String),

    /// Backing store failure (network, credentials, protocol).
    ///
    /// Store implementations surface transport-level problems through this
    /// variant; the cache never retries on its own.
    BackendError(String),

    /// Operation not available on this store.
    ///
    /// Example: path queries against the environment-variable store, which
    /// has no faithful reverse name mapping.
    NotImplemented(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(names) => write!(f, "Invalid parameter(s): {}", names),
            Error::InvalidVersion(msg) => write!(f, "Invalid version: {}", msg),
            Error::InvalidPath(path) => {
                write!(f, "Invalid path: {} (must start with a slash)", path)
            }
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
