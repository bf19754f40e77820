//! The controller future entity: state, result, and the dependent-future
//! registry that propagates cancellation into storage-layer queries
//! (`spec.md` §3, §4.2).

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::Result;
use crate::value_objects::data::Data;
use crate::value_objects::property::Property;
use crate::value_objects::status::AbiStatus;

/// The lifecycle state of a [`ControllerFuture`] (`spec.md` §4.2: `Pending
/// → {Success | Cancelled | Failed}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureState {
    Pending,
    Success,
    Cancelled,
    Failed(AbiStatus),
}

/// Owns an optional job pointer (tracked by the job system, not here), a
/// result value, a cancellation flag, and the set of dependent
/// storage-layer futures registered for cancellation propagation.
#[derive(Debug, Clone)]
pub struct ControllerFuture {
    id: HandleId,
    state: FutureState,
    result: Option<Data>,
    /// Ids of storage-layer futures registered via `AddDependentFuture`.
    dependents: Vec<u64>,
}

impl ControllerFuture {
    #[must_use]
    pub fn new(id: HandleId) -> Self {
        Self {
            id,
            state: FutureState::Pending,
            result: None,
            dependents: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> FutureState {
        self.state
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.state, FutureState::Cancelled)
    }

    /// A job's result is assigned exactly once; a future already resolved
    /// to `Cancelled` stays cancelled (`spec.md` §4.2).
    pub fn resolve_success(&mut self, result: Data) {
        if matches!(self.state, FutureState::Pending) {
            self.state = FutureState::Success;
            self.result = Some(result);
        }
    }

    pub fn resolve_failure(&mut self, status: AbiStatus) {
        if matches!(self.state, FutureState::Pending) {
            self.state = FutureState::Failed(status);
        }
    }

    /// Marks this future cancelled. The job system is responsible for
    /// dequeuing/interrupting the underlying job and for cancelling every
    /// id returned by [`ControllerFuture::dependents`].
    pub fn cancel(&mut self) {
        if matches!(self.state, FutureState::Pending) {
            self.state = FutureState::Cancelled;
        }
    }

    pub fn add_dependent_future(&mut self, storage_future_id: u64) {
        self.dependents.push(storage_future_id);
    }

    pub fn remove_dependent_future(&mut self, storage_future_id: u64) {
        self.dependents.retain(|id| *id != storage_future_id);
    }

    #[must_use]
    pub fn dependents(&self) -> &[u64] {
        &self.dependents
    }
}

impl Handle for ControllerFuture {
    fn kind(&self) -> HandleKind {
        HandleKind::Future
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::FutureType => Ok(match self.state {
                FutureState::Pending => 0,
                FutureState::Success => 1,
                FutureState::Cancelled => 2,
                FutureState::Failed(_) => 3,
            }),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::FutureObject => match &self.result {
                Some(data) => data.as_object(),
                None => Ok(None),
            },
            _ => Err(self.reject(property)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_before_resolution_sticks() {
        let mut f = ControllerFuture::new(HandleId::new(0));
        f.cancel();
        f.resolve_success(Data::UInt64(1));
        assert_eq!(f.state(), FutureState::Cancelled, "once cancelled, a late resolve must not overwrite it");
    }

    #[test]
    fn dependents_round_trip() {
        let mut f = ControllerFuture::new(HandleId::new(0));
        f.add_dependent_future(7);
        assert_eq!(f.dependents(), &[7]);
        f.remove_dependent_future(7);
        assert!(f.dependents().is_empty());
    }
}
