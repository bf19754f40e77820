//! The query factory port: schema-version-gated composition of the
//! per-operation query families (`spec.md` §4.4).

use crate::error::Result;
use crate::ports::storage::QuerySpec;

/// The event-producing operation a query family is composed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventOperation {
    Region,
    RegionSample,
    Dispatch,
    MemAlloc,
    MemCopy,
    PmcPerDispatch,
    PmcSample,
}

/// The seven query shapes every operation is composed into (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    /// Unique `(node, primary-id, secondary-id, category, operation)` tuples.
    TrackEnumeration,
    /// Same events pivoted by `(node, stream)`.
    StreamRegrouping,
    /// Ordered `(start, end, id, addressing)` for level assignment.
    LevelSource,
    /// Time-ranged selection with attached level.
    Slice,
    /// User-visible columns plus service columns for routing.
    Table,
    /// Bidirectional correlation via stack-id matches.
    DataFlow,
    /// Minimal addressing of a single event by id.
    EssentialInfo,
}

/// Bounds a [`QueryFamily::Slice`]/track-scoped composition to a time
/// window and/or explicit track id set.
#[derive(Debug, Clone, Default)]
pub struct QueryBounds {
    pub track_ids: Vec<u64>,
    pub time_start: Option<u64>,
    pub time_end: Option<u64>,
}

/// Composes a [`QuerySpec`] for one `(operation, family)` pair, choosing
/// among schema-version-gated emission paths that all bind to the same
/// stable column aliases (`spec.md` §4.4: the `rocpd_track`/`rocpd_timestamp`
/// join path at schema version ≥ 4, inline columns below it).
pub trait QueryFactory: Send + Sync {
    fn compose(
        &self,
        schema_version: u32,
        operation: EventOperation,
        family: QueryFamily,
        bounds: &QueryBounds,
    ) -> Result<QuerySpec>;
}

/// The stable column aliases consumers bind by rather than column
/// position (`spec.md` §4.4).
pub mod alias {
    pub const START_TS: &str = "startTs";
    pub const END_TS: &str = "endTs";
    pub const NODE_ID: &str = "nodeId";
    pub const PROCESS_ID: &str = "processId";
    pub const THREAD_ID: &str = "threadId";
    pub const AGENT_ID: &str = "agentId";
    pub const QUEUE_ID: &str = "queueId";
    pub const STREAM_ID: &str = "streamId";
    pub const COUNTER_ID: &str = "counterId";
    pub const COUNTER_VALUE: &str = "counterValue";
    pub const EVENT_LEVEL: &str = "eventLevel";
    pub const EVENT_NAME_ID: &str = "eventNameId";
    pub const CATEGORY_ID: &str = "categoryId";
}
