//! Leaf event records and their lazily-created children array (`spec.md` §3, §4.7).

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::Result;
use crate::value_objects::property::Property;

/// An interval with name, category, and nesting depth (`spec.md` GLOSSARY).
///
/// `level` is assigned once at load by the level assigner and treated as
/// immutable thereafter (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct Event {
    id: HandleId,
    start_ts: u64,
    end_ts: u64,
    name_id: u64,
    category_id: u64,
    top_name_id: u64,
    level: u8,
    children: Option<HandleId>,
}

impl Event {
    #[must_use]
    pub fn new(
        id: HandleId,
        start_ts: u64,
        end_ts: u64,
        name_id: u64,
        category_id: u64,
        top_name_id: u64,
    ) -> Self {
        Self {
            id,
            start_ts,
            end_ts,
            name_id,
            category_id,
            top_name_id,
            level: 0,
            children: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn start_ts(&self) -> u64 {
        self.start_ts
    }

    #[must_use]
    pub fn end_ts(&self) -> u64 {
        self.end_ts
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Set once by the level assigner; never mutated afterwards.
    pub fn set_level(&mut self, level: u8) {
        self.level = level;
    }

    /// `a` contains `e` iff `a.start <= e.start && a.end >= e.end` (`spec.md` §4.5).
    #[must_use]
    pub fn contains(&self, other: &Event) -> bool {
        self.start_ts <= other.start_ts && self.end_ts >= other.end_ts
    }

    pub fn attach_children(&mut self, children: HandleId) {
        self.children = Some(children);
    }
}

impl Handle for Event {
    fn kind(&self) -> HandleKind {
        HandleKind::Event
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::EventId => Ok(self.id.raw()),
            Property::EventStartTimestamp => Ok(self.start_ts),
            Property::EventEndTimestamp => Ok(self.end_ts),
            Property::EventNameId => Ok(self.name_id),
            Property::EventCategoryId => Ok(self.category_id),
            Property::EventTopNameId => Ok(self.top_name_id),
            Property::EventLevel => Ok(u64::from(self.level)),
            Property::EventChildrenCount => Ok(u64::from(self.children.is_some())),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::EventChildrenArray => Ok(self.children),
            _ => Err(self.reject(property)),
        }
    }
}

/// The lazily-created fan-out children array of an [`Event`] (`spec.md` §4.7).
#[derive(Debug, Clone, Default)]
pub struct EventChildren {
    entries: Vec<HandleId>,
}

impl EventChildren {
    #[must_use]
    pub fn new(entries: Vec<HandleId>) -> Self {
        Self { entries }
    }
}

impl Handle for EventChildren {
    fn kind(&self) -> HandleKind {
        HandleKind::EventChildren
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::ArrayCount => Ok(self.entries.len() as u64),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::EventChildrenEntry => {
                Self::check_index(index, self.entries.len() as u64)?;
                Ok(Some(self.entries[index as usize]))
            }
            _ => Err(self.reject(property)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_inclusive_of_equal_bounds() {
        let a = Event::new(HandleId::new(0), 0, 100, 0, 0, 0);
        let e = Event::new(HandleId::new(1), 0, 100, 0, 0, 0);
        assert!(a.contains(&e));
    }

    #[test]
    fn level_starts_at_zero() {
        let e = Event::new(HandleId::new(0), 0, 10, 0, 0, 0);
        assert_eq!(e.level(), 0);
    }
}
