//! Relationship and annotation lookups by event id (`spec.md` §4 "Flow/Stack/ExtData fetch").

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::Result;
use crate::value_objects::property::Property;

/// A bidirectional correlation edge between two events, matched via
/// stack-id (`spec.md` §4.4 "Data-flow").
#[derive(Debug, Clone)]
pub struct FlowControl {
    source_event_id: HandleId,
    target_event_id: HandleId,
}

impl FlowControl {
    #[must_use]
    pub fn new(source_event_id: HandleId, target_event_id: HandleId) -> Self {
        Self { source_event_id, target_event_id }
    }
}

impl Handle for FlowControl {
    fn kind(&self) -> HandleKind {
        HandleKind::FlowControl
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::FlowControlSourceEventId => Ok(Some(self.source_event_id)),
            Property::FlowControlTargetEventId => Ok(Some(self.target_event_id)),
            _ => Err(self.reject(property)),
        }
    }
}

/// An ordered list of call-stack frame names for a single event.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<String>,
}

impl CallStack {
    #[must_use]
    pub fn new(frames: Vec<String>) -> Self {
        Self { frames }
    }
}

impl Handle for CallStack {
    fn kind(&self) -> HandleKind {
        HandleKind::CallStack
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::CallStackDepth => Ok(self.frames.len() as u64),
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, index: u64) -> Result<String> {
        match property {
            Property::CallStackFrame => {
                Self::check_index(index, self.frames.len() as u64)?;
                Ok(self.frames[index as usize].clone())
            }
            _ => Err(self.reject(property)),
        }
    }
}
