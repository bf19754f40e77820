//! The polymorphic handle base: kind tags, opaque ids, and the typed
//! property get/set contract (`spec.md` §4.1).

use crate::error::{Error, Result};
use crate::value_objects::property::Property;

/// Every handle kind the controller ABI can hand out.
///
/// `Controller` is split into `System` / `Compute` per `spec.md` §3 (a
/// timeline trace vs. a standalone compute-kernel roofline session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// System (timeline) controller root.
    ControllerSystem,
    /// Compute (roofline) controller root.
    ControllerCompute,
    Timeline,
    Track,
    Graph,
    Event,
    Sample,
    SampleLod,
    Table,
    Array,
    Arguments,
    Future,
    SummaryMetrics,
    Summary,
    Plot,
    Workload,
    Kernel,
    Roofline,
    TopologyNode,
    Node,
    Process,
    Processor,
    Thread,
    Queue,
    Stream,
    Counter,
    FlowControl,
    CallStack,
    /// The lazily-created children array of an [`crate::entities::event::Event`].
    EventChildren,
}

/// Opaque, non-owning reference to a handle living in a controller's arena.
///
/// Mirrors the original interface's `rocprofvis_handle_t*`: sub-handles
/// returned by `GetObject` stay valid only as long as the owning
/// controller lives and must never be freed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    /// Wrap a raw arena index.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw arena index this id addresses.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Blanket downcast support for arena-stored `dyn Handle` trait objects,
/// the Rust analogue of the original's templated `Reference<T>` that
/// `static_cast`s a generic handle back to its concrete type.
pub trait AsAny: std::any::Any {
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

impl<T: std::any::Any> AsAny for T {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// The uniform typed property contract every handle implements.
///
/// Handles that do not define a given property return
/// [`Error::UnhandledProperty`] from the default trait methods; concrete
/// handles override only the properties they actually carry and must
/// still route anything outside their own property range through
/// [`Handle::reject`] rather than panicking.
pub trait Handle: AsAny {
    /// This handle's kind, fixed for the handle's whole lifetime.
    fn kind(&self) -> HandleKind;

    /// Read an unsigned 64-bit property.
    fn get_u64(&self, property: Property, index: u64) -> Result<u64> {
        Err(self.reject(property))
    }

    /// Read a floating point property.
    fn get_f64(&self, property: Property, index: u64) -> Result<f64> {
        Err(self.reject(property))
    }

    /// Read a string property. Callers follow the two-call length-probe
    /// convention at the ABI boundary (`spec.md` §4.1); at this layer the
    /// full string is simply returned.
    fn get_string(&self, property: Property, index: u64) -> Result<String> {
        Err(self.reject(property))
    }

    /// Read an object-reference property.
    fn get_object(&self, property: Property, index: u64) -> Result<Option<HandleId>> {
        Err(self.reject(property))
    }

    /// Write an unsigned 64-bit property.
    fn set_u64(&mut self, property: Property, index: u64, value: u64) -> Result<()> {
        Err(self.reject(property))
    }

    /// Write a floating point property.
    fn set_f64(&mut self, property: Property, index: u64, value: f64) -> Result<()> {
        Err(self.reject(property))
    }

    /// Write a string property.
    fn set_string(&mut self, property: Property, index: u64, value: String) -> Result<()> {
        Err(self.reject(property))
    }

    /// Write an object-reference property.
    fn set_object(&mut self, property: Property, index: u64, value: Option<HandleId>) -> Result<()> {
        Err(self.reject(property))
    }

    /// Build the correctly-classified rejection error for `property`:
    /// [`Error::InvalidEnum`] if the enum value is unknown at all,
    /// [`Error::UnhandledProperty`] if it is known but belongs to a
    /// different handle kind than `self`.
    fn reject(&self, property: Property) -> Error {
        if property.kind_range().is_some() {
            Error::UnhandledProperty {
                property: property as u32,
                kind: self.kind(),
            }
        } else {
            Error::InvalidEnum(property as u32)
        }
    }

    /// Validate an indexed property's index against a handle-reported
    /// element count, surfacing [`Error::OutOfRange`] uniformly.
    fn check_index(index: u64, count: u64) -> Result<()> {
        if index < count {
            Ok(())
        } else {
            Err(Error::OutOfRange { index, count })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;
    impl Handle for Dummy {
        fn kind(&self) -> HandleKind {
            HandleKind::Graph
        }
    }

    #[test]
    fn unhandled_property_on_foreign_kind() {
        let dummy = Dummy;
        let err = dummy
            .get_u64(Property::TrackMinTimestamp, 0)
            .unwrap_err();
        assert!(matches!(err, Error::UnhandledProperty { .. }));
    }

    #[test]
    fn out_of_range_index() {
        assert!(Dummy::check_index(5, 3).is_err());
        assert!(Dummy::check_index(2, 3).is_ok());
    }
}
