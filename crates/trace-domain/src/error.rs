//! Error handling types and the ABI status enumeration.

use thiserror::Error;

/// Result type alias for internal (non-ABI) operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the trace analytics engine.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A property enum value does not belong to the addressed handle kind.
    #[error("property {property} is not handled by handle kind {kind:?}")]
    UnhandledProperty {
        /// The property that was requested.
        property: u32,
        /// The handle kind that rejected it.
        kind: crate::entities::handle::HandleKind,
    },

    /// A property enum value is outside the known range entirely.
    #[error("invalid property enum value {0}")]
    InvalidEnum(u32),

    /// A value was read/written with the wrong primitive tag.
    #[error("invalid type: expected {expected}, found {found}")]
    InvalidType {
        /// The tag that was expected.
        expected: &'static str,
        /// The tag that was actually present.
        found: &'static str,
    },

    /// An indexed property was addressed with `index >= count`.
    #[error("index {index} out of range (count = {count})")]
    OutOfRange {
        /// The index that was requested.
        index: u64,
        /// The valid element count.
        count: u64,
    },

    /// A computed/read-only property was targeted by a setter.
    #[error("property {0} is read-only")]
    ReadOnly(u32),

    /// A caller argument failed validation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Requested data has not been loaded yet.
    #[error("not loaded: {resource}")]
    NotLoaded {
        /// The resource that has not been loaded.
        resource: String,
    },

    /// Operation is still pending.
    #[error("pending")]
    Pending,

    /// Operation was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Operation timed out waiting on a future.
    #[error("timed out")]
    Timeout,

    /// Allocation failed inside the memory manager.
    #[error("memory allocation failed: {message}")]
    MemoryAllocError {
        /// Description of the failed allocation.
        message: String,
    },

    /// The requested schema version / database kind is not supported.
    #[error("not supported: {message}")]
    NotSupported {
        /// Description of what isn't supported.
        message: String,
    },

    /// Storage-layer error, mapped from the storage interface.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration-related error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Catch-all for conditions with no more specific variant.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Build an [`Error::InvalidArgument`].
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Build an [`Error::Storage`] with no source.
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Build an [`Error::NotSupported`].
    pub fn not_supported<S: Into<String>>(message: S) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }

    /// Map this error onto the flat ABI status enumeration (`spec.md` §6).
    #[must_use]
    pub fn to_status(&self) -> crate::value_objects::status::AbiStatus {
        use crate::value_objects::status::AbiStatus;
        match self {
            Self::UnhandledProperty { .. } => AbiStatus::UnhandledProperty,
            Self::InvalidEnum(_) => AbiStatus::InvalidEnum,
            Self::InvalidType { .. } => AbiStatus::InvalidType,
            Self::OutOfRange { .. } => AbiStatus::OutOfRange,
            Self::ReadOnly(_) => AbiStatus::ReadOnly,
            Self::InvalidArgument { .. } => AbiStatus::InvalidArgument,
            Self::NotLoaded { .. } => AbiStatus::NotLoaded,
            Self::Pending => AbiStatus::Pending,
            Self::Cancelled => AbiStatus::Cancelled,
            Self::Timeout => AbiStatus::Timeout,
            Self::MemoryAllocError { .. } => AbiStatus::MemoryAllocError,
            Self::NotSupported { .. } => AbiStatus::NotSupported,
            Self::Io { .. }
            | Self::Json { .. }
            | Self::Storage { .. }
            | Self::Config { .. }
            | Self::Unknown(_) => AbiStatus::UnknownError,
        }
    }
}
