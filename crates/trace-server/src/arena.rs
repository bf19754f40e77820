//! The handle arena: every live object a controller has vended, keyed by
//! [`HandleId`] and reference-counted the way the original's `Reference<T>`
//! wrapper validates a raw pointer before dereferencing it
//! (`rocprofvis_controller_handle.cpp`). Here the "pointer" is a
//! `dashmap` key and validity is simply map membership.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use trace_domain::entities::handle::{Handle, HandleId, HandleKind};
use trace_domain::error::{Error, Result};

/// An arena slot: the boxed handle plus whether the caller owns it.
///
/// Only root kinds (`spec.md` §6: Controller, Future, Array, Arguments,
/// SummaryMetrics) are freeable by callers; every other kind is a
/// sub-handle borrowed from its owner and outlives only as long as the
/// owner keeps it registered.
struct Slot {
    handle: Box<dyn Handle + Send + Sync>,
    is_root: bool,
}

/// Per-controller registry of live handles.
///
/// Cheaply cloneable: internally an `Arc<DashMap<..>>`, so the facade
/// layer can hand a `HandleArena` to spawned jobs without lifetime games.
#[derive(Clone)]
pub struct HandleArena {
    slots: Arc<DashMap<HandleId, Slot>>,
    next_id: Arc<AtomicU64>,
}

/// Root handle kinds a caller may [`HandleArena::free`] directly
/// (`spec.md` §6).
#[must_use]
pub fn is_root_kind(kind: HandleKind) -> bool {
    matches!(
        kind,
        HandleKind::ControllerSystem
            | HandleKind::ControllerCompute
            | HandleKind::Future
            | HandleKind::Array
            | HandleKind::Arguments
            | HandleKind::SummaryMetrics
    )
}

impl Default for HandleArena {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleArena {
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Arc::new(DashMap::new()), next_id: Arc::new(AtomicU64::new(1)) }
    }

    /// Register a new handle, returning its id. `is_root` should come
    /// from [`is_root_kind`] applied to the handle's own kind, unless
    /// the handle is explicitly a borrowed sub-object.
    pub fn insert(&self, handle: Box<dyn Handle + Send + Sync>, is_root: bool) -> HandleId {
        let id = HandleId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots.insert(id, Slot { handle, is_root });
        id
    }

    /// Register a borrowed sub-handle (never freeable directly by a caller).
    pub fn insert_borrowed(&self, handle: Box<dyn Handle + Send + Sync>) -> HandleId {
        self.insert(handle, false)
    }

    /// Look up a handle's kind without borrowing its contents.
    pub fn kind_of(&self, id: HandleId) -> Result<HandleKind> {
        self.slots.get(&id).map(|s| s.handle.kind()).ok_or_else(|| Error::invalid_argument("unknown handle"))
    }

    /// Run `f` with read access to the handle at `id`.
    pub fn with<R>(&self, id: HandleId, f: impl FnOnce(&dyn Handle) -> R) -> Result<R> {
        self.slots.get(&id).map(|s| f(s.handle.as_ref())).ok_or_else(|| Error::invalid_argument("unknown handle"))
    }

    /// Run `f` with mutable access to the handle at `id`.
    pub fn with_mut<R>(&self, id: HandleId, f: impl FnOnce(&mut dyn Handle) -> R) -> Result<R> {
        self.slots.get_mut(&id).map(|mut s| f(s.handle.as_mut())).ok_or_else(|| Error::invalid_argument("unknown handle"))
    }

    /// `free(handle)`: only a root-owned handle is actually released here;
    /// freeing a borrowed sub-handle is a silent no-op (`spec.md` §4.12
    /// Failure Semantics: "freeing a borrowed sub-handle" is not an error),
    /// since sub-handles are reclaimed implicitly when their owner is freed.
    pub fn free(&self, id: HandleId) -> Result<()> {
        let Some(entry) = self.slots.get(&id) else {
            return Err(Error::invalid_argument("unknown handle"));
        };
        if !entry.is_root {
            return Ok(());
        }
        drop(entry);
        self.slots.remove(&id);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_domain::entities::event::Event;

    #[test]
    fn freeing_a_borrowed_handle_is_a_silent_no_op() {
        let arena = HandleArena::new();
        let id = arena.insert_borrowed(Box::new(Event::new(HandleId::new(0), 0, 10, 1, 2, 3)));
        assert!(arena.free(id).is_ok());
        assert_eq!(arena.len(), 1, "the slot must stay in place, not be removed");
    }

    #[test]
    fn root_handles_free_and_vanish() {
        let arena = HandleArena::new();
        let id = arena.insert(Box::new(Event::new(HandleId::new(0), 0, 10, 1, 2, 3)), true);
        assert!(arena.free(id).is_ok());
        assert!(arena.is_empty());
    }
}
