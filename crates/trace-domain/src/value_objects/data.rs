//! The tagged primitive value (`Data`) that flows through the property ABI.

use crate::entities::handle::HandleId;
use crate::error::{Error, Result};

/// A tagged variant over the four primitive kinds the ABI exchanges.
///
/// `Data::Object` is a weak, non-owning reference: it stores the id of a
/// handle living in the controller's arena, never the handle itself.
/// Conversion between tags is explicit and fails with [`Error::InvalidType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// An unsigned 64-bit integer (timestamps, ids, counts).
    UInt64(u64),
    /// A double-precision float (counter values, ratios).
    Double(f64),
    /// An owned UTF-8 string.
    String(String),
    /// A weak reference to another handle in the owning controller's arena.
    Object(Option<HandleId>),
}

impl Data {
    /// The primitive tag name, used in [`Error::InvalidType`] messages.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::UInt64(_) => "u64",
            Self::Double(_) => "f64",
            Self::String(_) => "string",
            Self::Object(_) => "object",
        }
    }

    /// Read this value as `u64`, failing if it is not tagged `UInt64`.
    pub fn as_u64(&self) -> Result<u64> {
        match self {
            Self::UInt64(v) => Ok(*v),
            other => Err(Error::InvalidType {
                expected: "u64",
                found: other.tag(),
            }),
        }
    }

    /// Read this value as `f64`, failing if it is not tagged `Double`.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Self::Double(v) => Ok(*v),
            other => Err(Error::InvalidType {
                expected: "f64",
                found: other.tag(),
            }),
        }
    }

    /// Read this value as `&str`, failing if it is not tagged `String`.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::String(v) => Ok(v.as_str()),
            other => Err(Error::InvalidType {
                expected: "string",
                found: other.tag(),
            }),
        }
    }

    /// Read this value as an optional [`HandleId`], failing if it is not
    /// tagged `Object`.
    pub fn as_object(&self) -> Result<Option<HandleId>> {
        match self {
            Self::Object(v) => Ok(*v),
            other => Err(Error::InvalidType {
                expected: "object",
                found: other.tag(),
            }),
        }
    }
}

impl From<u64> for Data {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<f64> for Data {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Data {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<HandleId> for Data {
    fn from(v: HandleId) -> Self {
        Self::Object(Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_tag_is_invalid_type() {
        let data = Data::UInt64(7);
        assert!(data.as_f64().is_err());
        assert_eq!(data.as_u64().unwrap(), 7);
    }

    #[test]
    fn object_round_trips_through_from() {
        let id = HandleId::new(3);
        let data: Data = id.into();
        assert_eq!(data.as_object().unwrap(), Some(id));
    }
}
