//! # Domain Layer
//!
//! Core types for the profiling-trace analytics engine. Contains only
//! pure domain entities, value objects, and port traits — no I/O, no
//! async runtime, no concrete storage backend.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`entities`] | Handles addressed by the property ABI, with identity |
//! | [`value_objects`] | The tagged `Data` primitive, `Property`, `AbiStatus` |
//! | [`ports`] | Storage, job-scheduling, and query-factory collaborator traits |
//! | [`error`] | The canonical error type and its mapping to `AbiStatus` |
//!
//! Every exposed object is a polymorphic [`entities::Handle`] with typed
//! get/set accessors keyed by a [`value_objects::Property`]. Sub-handles
//! are weak references (`value_objects::Data::Object`) into the owning
//! controller's arena, never owning pointers.

/// Handles addressed by the property ABI: trace, track, graph, event,
/// sample, table, summary, topology, and the smaller supporting kinds.
pub mod entities;
/// The canonical error type and its mapping to the ABI status enumeration.
pub mod error;
/// Storage, job-scheduling, and query-factory port traits.
pub mod ports;
/// The tagged `Data` primitive, the `Property` enumeration, `AbiStatus`.
pub mod value_objects;

pub use entities::{Handle, HandleId, HandleKind};
pub use error::{Error, Result};
pub use value_objects::{AbiStatus, Data, Property};
