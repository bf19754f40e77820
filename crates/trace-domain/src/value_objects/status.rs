//! The stable status enumeration returned by every ABI entry point (`spec.md` §6).

use serde::{Deserialize, Serialize};

/// Result status returned by every controller ABI call.
///
/// Values are listed in the order `spec.md` §6 gives them; callers binding
/// across a language boundary depend on this order staying stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbiStatus {
    /// The call completed successfully.
    Success,
    /// An error with no more specific status applies.
    UnknownError,
    /// A caller-supplied argument was invalid (e.g. a null buffer).
    InvalidArgument,
    /// The property enum value itself is not a recognized enumerator.
    InvalidEnum,
    /// The value was requested/set with the wrong primitive tag.
    InvalidType,
    /// The property is computed and cannot be set.
    ReadOnly,
    /// An indexed property was addressed with `index >= count`.
    OutOfRange,
    /// The memory manager could not satisfy an allocation.
    MemoryAllocError,
    /// The requested data has not been loaded yet.
    NotLoaded,
    /// The operation or schema version is not supported.
    NotSupported,
    /// The operation has not completed yet.
    Pending,
    /// The operation was cancelled.
    Cancelled,
    /// The operation timed out.
    Timeout,
    /// The property is not defined for the addressed handle kind.
    UnhandledProperty,
}

impl AbiStatus {
    /// `true` for [`AbiStatus::Success`], `false` for every error status.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<crate::error::Error> for AbiStatus {
    fn from(err: crate::error::Error) -> Self {
        err.to_status()
    }
}
