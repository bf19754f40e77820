//! The trace root: the controller's single arena root, owning a
//! `Timeline`, tracks, tables, a summary tree, and a topology (`spec.md` §3).

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::{Error, Result};
use crate::value_objects::property::Property;

/// The root object returned by `controller_alloc`, owning every other
/// handle in its arena for the lifetime of the controller (`spec.md` §3).
///
/// `kind` distinguishes a timeline trace session (`ControllerSystem`) from
/// a standalone compute/roofline session (`ControllerCompute`, `spec.md`
/// §3). Both share this shape; a compute session simply never populates
/// the timeline/track fields.
#[derive(Debug, Clone)]
pub struct Trace {
    kind: HandleKind,
    file_path: String,
    schema_version: u32,
    memory_budget_factor: f64,
    timeline: Option<HandleId>,
    track_count: u64,
    event_table: Option<HandleId>,
    sample_table: Option<HandleId>,
    search_results_table: Option<HandleId>,
    summary: Option<HandleId>,
    topology_root: Option<HandleId>,
}

impl Trace {
    #[must_use]
    pub fn new(kind: HandleKind, file_path: String) -> Self {
        Self {
            kind,
            file_path,
            schema_version: 0,
            memory_budget_factor: 2.0,
            timeline: None,
            track_count: 0,
            event_table: None,
            sample_table: None,
            search_results_table: None,
            summary: None,
            topology_root: None,
        }
    }

    pub fn set_schema_version(&mut self, version: u32) {
        self.schema_version = version;
    }

    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    #[must_use]
    pub fn memory_budget_factor(&self) -> f64 {
        self.memory_budget_factor
    }

    pub fn set_timeline(&mut self, timeline: HandleId, track_count: u64) {
        self.timeline = Some(timeline);
        self.track_count = track_count;
    }

    pub fn set_event_table(&mut self, table: HandleId) {
        self.event_table = Some(table);
    }

    pub fn set_sample_table(&mut self, table: HandleId) {
        self.sample_table = Some(table);
    }

    pub fn set_search_results_table(&mut self, table: HandleId) {
        self.search_results_table = Some(table);
    }

    pub fn set_summary(&mut self, summary: HandleId) {
        self.summary = Some(summary);
    }

    pub fn set_topology_root(&mut self, root: HandleId) {
        self.topology_root = Some(root);
    }
}

impl Handle for Trace {
    fn kind(&self) -> HandleKind {
        self.kind
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::ControllerTrackCount => Ok(self.track_count),
            Property::ControllerSchemaVersion => Ok(u64::from(self.schema_version)),
            _ => Err(self.reject(property)),
        }
    }

    fn get_f64(&self, property: Property, _index: u64) -> Result<f64> {
        match property {
            Property::ControllerMemoryBudgetFactor => Ok(self.memory_budget_factor),
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, _index: u64) -> Result<String> {
        match property {
            Property::ControllerTraceFilePath => Ok(self.file_path.clone()),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::ControllerTimeline => self
                .timeline
                .ok_or_else(|| Error::NotLoaded { resource: "timeline".into() })
                .map(Some),
            Property::ControllerEventTable => Ok(self.event_table),
            Property::ControllerSampleTable => Ok(self.sample_table),
            Property::ControllerSearchResultsTable => Ok(self.search_results_table),
            Property::ControllerSummary => Ok(self.summary),
            Property::ControllerTopologyRoot => Ok(self.topology_root),
            _ => Err(self.reject(property)),
        }
    }

    fn set_f64(&mut self, property: Property, _index: u64, value: f64) -> Result<()> {
        match property {
            Property::ControllerMemoryBudgetFactor => {
                self.memory_budget_factor = value;
                Ok(())
            }
            _ => Err(self.reject(property)),
        }
    }
}

/// Owns an ordered list of `Graph`s, each bound to a `Track` (`spec.md` §4.6).
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    graphs: Vec<HandleId>,
}

impl Timeline {
    #[must_use]
    pub fn new(graphs: Vec<HandleId>) -> Self {
        Self { graphs }
    }
}

impl Handle for Timeline {
    fn kind(&self) -> HandleKind {
        HandleKind::Timeline
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::TimelineGraphCount => Ok(self.graphs.len() as u64),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::TimelineGraph => {
                Self::check_index(index, self.graphs.len() as u64)?;
                Ok(Some(self.graphs[index as usize]))
            }
            _ => Err(self.reject(property)),
        }
    }
}
