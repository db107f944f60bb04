//! Document Processor Error Hierarchy
//!
//! Errors are split by the tier at which they surface:
//! - construction time ([`ConfigurationError`], [`ConnectionError`]), fatal to the
//!   processor instance
//! - per item ([`ItemError`]), attached to the message and never aborting siblings
//! - per batch ([`BatchError`]), failing the whole bulk call with no partial results

use std::fmt;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file/environment loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid processor settings detected at construction
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Store unreachable or not ready
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Whole-batch transport failure
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("invalid transcoder: {0}")]
    InvalidTranscoder(String),

    #[error("invalid execution mode: {0}")]
    InvalidMode(String),

    /// Insert, replace and upsert need a value expression
    #[error("value required")]
    ValueRequired,

    #[error("invalid expression `{expr}`: {reason}")]
    InvalidExpression { expr: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("Bucket {bucket} not ready after {timeout:?}")]
    NotReady { bucket: String, timeout: Duration },

    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("Connection already closed")]
    Closed,
}

/// Failure of the round trip itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Connection closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Batch cancelled")]
    Cancelled,

    #[error("Store answered {actual} results for {expected} operations")]
    ResultCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemErrorKind {
    NotFound,
    AlreadyExists,
    Timeout,
    CasMismatch,
    Encoding,
    Decoding,
    Expression,
    Other,
}

impl ItemErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemErrorKind::NotFound => "not_found",
            ItemErrorKind::AlreadyExists => "already_exists",
            ItemErrorKind::Timeout => "timeout",
            ItemErrorKind::CasMismatch => "cas_mismatch",
            ItemErrorKind::Encoding => "encoding",
            ItemErrorKind::Decoding => "decoding",
            ItemErrorKind::Expression => "expression",
            ItemErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ItemErrorKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store-side or evaluation outcome scoped to a single key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct ItemError {
    pub kind: ItemErrorKind,
    pub detail: String,
}

impl ItemError {
    pub fn new(
        kind: ItemErrorKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn not_found(key: &str) -> Self {
        Self::new(ItemErrorKind::NotFound, format!("document not found: {key}"))
    }

    pub fn already_exists(key: &str) -> Self {
        Self::new(ItemErrorKind::AlreadyExists, format!("document exists: {key}"))
    }

    pub fn timeout(
        key: &str,
        after: Duration,
    ) -> Self {
        Self::new(ItemErrorKind::Timeout, format!("{key} timed out after {after:?}"))
    }

    pub fn kind(&self) -> ItemErrorKind {
        self.kind
    }
}

/// Error returned by a single store call: either scoped to the key, or a
/// failure of the connection that invalidates every call in flight.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Item(#[from] ItemError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
