//! The property enumeration, partitioned into contiguous per-kind ranges
//! so that a kind lookup is a single range check (`spec.md` §4.1).

use crate::entities::handle::HandleKind;

/// Every addressable property across every handle kind.
///
/// Discriminants are grouped into blocks of 100 per [`HandleKind`] (a
/// property belonging to `Track` is always in `300..400`, etc.) except for
/// the `Common*` properties below `100`, which every handle kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Property {
    // ---- Common (accepted by every handle kind) ----
    CommonMemoryUsageInclusive = 0,
    CommonMemoryUsageExclusive = 1,

    // ---- Controller (100..200) ----
    ControllerTraceFilePath = 100,
    ControllerTimeline = 101,
    ControllerTrackCount = 102,
    ControllerEventTable = 103,
    ControllerSampleTable = 104,
    ControllerSearchResultsTable = 105,
    ControllerSummary = 106,
    ControllerTopologyRoot = 107,
    ControllerMemoryBudgetFactor = 108,
    ControllerSchemaVersion = 109,

    // ---- Timeline (200..300) ----
    TimelineGraphCount = 200,
    TimelineGraph = 201,

    // ---- Track (300..400) ----
    TrackId = 300,
    TrackType = 301,
    TrackCategory = 302,
    TrackName = 303,
    TrackSubName = 304,
    TrackMinTimestamp = 305,
    TrackMaxTimestamp = 306,
    TrackMinValue = 307,
    TrackMaxValue = 308,
    TrackMetadataCount = 309,
    TrackMetadataCategory = 310,
    TrackMetadataName = 311,
    TrackMetadataValue = 312,
    TrackDmHandle = 313,

    // ---- Graph (400..500) ----
    GraphTrack = 400,
    GraphRenderHint = 401,
    GraphLodTier = 402,

    // ---- Event (500..600) ----
    EventId = 500,
    EventStartTimestamp = 501,
    EventEndTimestamp = 502,
    EventNameId = 503,
    EventCategoryId = 504,
    EventTopNameId = 505,
    EventLevel = 506,
    EventChildrenArray = 507,
    EventChildrenCount = 508,

    // ---- Sample (600..610) ----
    SampleId = 600,
    SampleTimestamp = 601,
    SampleValue = 602,

    // ---- SampleLod (610..620) ----
    SampleLodId = 610,
    SampleLodTimestamp = 611,
    SampleLodValue = 612,
    SampleLodChildCount = 613,

    // ---- Table (700..800) ----
    TableId = 700,
    TableColumnCount = 701,
    TableColumnName = 702,
    TableColumnType = 703,
    TableRowCount = 704,

    // ---- Array (800..900) ----
    ArrayCount = 800,
    ArrayEntryIndexed = 801,

    // ---- Arguments (900..1000) ----
    ArgumentsFilter = 900,
    ArgumentsGroupBy = 901,
    ArgumentsGroupColumns = 902,
    ArgumentsSortColumn = 903,
    ArgumentsSortOrder = 904,
    ArgumentsTimeStart = 905,
    ArgumentsTimeEnd = 906,
    ArgumentsSummary = 907,
    ArgumentsStringFilter = 908,
    ArgumentsTrackId = 909,

    // ---- Future (1000..1100) ----
    FutureResult = 1000,
    FutureType = 1001,
    FutureObject = 1002,

    // ---- SummaryMetrics (1100..1150) ----
    SummaryMetricsGfxUtil = 1100,
    SummaryMetricsMemUtil = 1101,
    SummaryMetricsKernelExecTimeTotal = 1102,
    SummaryMetricsTopKernelCount = 1103,
    SummaryMetricsTopKernelName = 1104,
    SummaryMetricsTopKernelExecTimeSum = 1105,
    SummaryMetricsTopKernelExecTimePct = 1106,
    SummaryMetricsTopKernelInvocations = 1107,

    // ---- Summary (1150..1200) ----
    SummaryRoot = 1150,
    SummaryChildCount = 1151,
    SummaryChild = 1152,

    // ---- Plot (1200..1210) ----
    PlotTrack = 1200,
    PlotKind = 1201,

    // ---- Workload (1210..1220) ----
    WorkloadName = 1210,
    WorkloadKernelCount = 1211,

    // ---- Kernel (1220..1230) ----
    KernelName = 1220,
    KernelDurationNs = 1221,

    // ---- Roofline (1230..1240) ----
    RooflineArithmeticIntensity = 1230,
    RooflineAchievedFlops = 1231,

    // ---- TopologyNode (1300..1310) ----
    TopologyRootChildCount = 1300,
    TopologyRootChild = 1301,

    // ---- Node (1310..1320) ----
    NodeId = 1310,
    NodeName = 1311,
    NodeProcessCount = 1312,
    NodeProcessorCount = 1313,

    // ---- Process (1320..1330) ----
    ProcessId = 1320,
    ProcessName = 1321,
    ProcessParentNode = 1322,
    ProcessThreadCount = 1323,
    ProcessQueueCount = 1324,

    // ---- Processor (1330..1340) ----
    ProcessorId = 1330,
    ProcessorName = 1331,
    ProcessorParentNode = 1332,
    ProcessorStreamCount = 1333,
    ProcessorCounterCount = 1334,

    // ---- Thread (1340..1350) ----
    ThreadId = 1340,
    ThreadParentProcess = 1341,

    // ---- Queue (1350..1360) ----
    QueueId = 1350,
    QueueParentProcess = 1351,

    // ---- Stream (1360..1370) ----
    StreamId = 1360,
    StreamParentProcessor = 1361,

    // ---- Counter (1370..1380) ----
    CounterId = 1370,
    CounterParentProcessor = 1371,
    CounterName = 1372,

    // ---- FlowControl (1400..1410) ----
    FlowControlSourceEventId = 1400,
    FlowControlTargetEventId = 1401,

    // ---- CallStack (1410..1420) ----
    CallStackDepth = 1410,
    CallStackFrame = 1411,

    // ---- Event.Children (1420..1430) ----
    EventChildrenEntry = 1420,
}

impl Property {
    /// The [`HandleKind`] this property is addressed to, or `None` for a
    /// value outside any assigned block (callers at the FFI boundary
    /// build a `Property` from a raw `u32` and surface `InvalidEnum`
    /// before ever reaching this method with a value outside the enum).
    #[must_use]
    pub fn kind_range(self) -> Option<HandleKind> {
        let v = self as u32;
        Some(match v {
            0..=99 => return None, // common: caller must check kind separately
            100..=199 => HandleKind::ControllerSystem,
            200..=299 => HandleKind::Timeline,
            300..=399 => HandleKind::Track,
            400..=499 => HandleKind::Graph,
            500..=599 => HandleKind::Event,
            600..=609 => HandleKind::Sample,
            610..=619 => HandleKind::SampleLod,
            700..=799 => HandleKind::Table,
            800..=899 => HandleKind::Array,
            900..=999 => HandleKind::Arguments,
            1000..=1099 => HandleKind::Future,
            1100..=1149 => HandleKind::SummaryMetrics,
            1150..=1199 => HandleKind::Summary,
            1200..=1209 => HandleKind::Plot,
            1210..=1219 => HandleKind::Workload,
            1220..=1229 => HandleKind::Kernel,
            1230..=1239 => HandleKind::Roofline,
            1300..=1309 => HandleKind::TopologyNode,
            1310..=1319 => HandleKind::Node,
            1320..=1329 => HandleKind::Process,
            1330..=1339 => HandleKind::Processor,
            1340..=1349 => HandleKind::Thread,
            1350..=1359 => HandleKind::Queue,
            1360..=1369 => HandleKind::Stream,
            1370..=1379 => HandleKind::Counter,
            1400..=1409 => HandleKind::FlowControl,
            1410..=1419 => HandleKind::CallStack,
            1420..=1429 => HandleKind::EventChildren,
            _ => return None,
        })
    }

    /// `true` if `self` is one of the `Common*` properties accepted by
    /// every handle kind regardless of [`Property::kind_range`].
    #[must_use]
    pub fn is_common(self) -> bool {
        (self as u32) < 100
    }

    /// Decode a raw ABI property value. Returns `None` for a discriminant
    /// that matches no known property, which the caller surfaces as
    /// `InvalidEnum`.
    #[must_use]
    pub fn from_u32(raw: u32) -> Option<Self> {
        // A small explicit table keeps FFI decoding infallible and total
        // without `unsafe` transmutes across the enum's non-contiguous
        // discriminant blocks.
        PROPERTY_TABLE.iter().copied().find(|p| *p as u32 == raw)
    }
}

const PROPERTY_TABLE: &[Property] = &[
    Property::CommonMemoryUsageInclusive,
    Property::CommonMemoryUsageExclusive,
    Property::ControllerTraceFilePath,
    Property::ControllerTimeline,
    Property::ControllerTrackCount,
    Property::ControllerEventTable,
    Property::ControllerSampleTable,
    Property::ControllerSearchResultsTable,
    Property::ControllerSummary,
    Property::ControllerTopologyRoot,
    Property::ControllerMemoryBudgetFactor,
    Property::ControllerSchemaVersion,
    Property::TimelineGraphCount,
    Property::TimelineGraph,
    Property::TrackId,
    Property::TrackType,
    Property::TrackCategory,
    Property::TrackName,
    Property::TrackSubName,
    Property::TrackMinTimestamp,
    Property::TrackMaxTimestamp,
    Property::TrackMinValue,
    Property::TrackMaxValue,
    Property::TrackMetadataCount,
    Property::TrackMetadataCategory,
    Property::TrackMetadataName,
    Property::TrackMetadataValue,
    Property::TrackDmHandle,
    Property::GraphTrack,
    Property::GraphRenderHint,
    Property::GraphLodTier,
    Property::EventId,
    Property::EventStartTimestamp,
    Property::EventEndTimestamp,
    Property::EventNameId,
    Property::EventCategoryId,
    Property::EventTopNameId,
    Property::EventLevel,
    Property::EventChildrenArray,
    Property::EventChildrenCount,
    Property::SampleId,
    Property::SampleTimestamp,
    Property::SampleValue,
    Property::SampleLodId,
    Property::SampleLodTimestamp,
    Property::SampleLodValue,
    Property::SampleLodChildCount,
    Property::TableId,
    Property::TableColumnCount,
    Property::TableColumnName,
    Property::TableColumnType,
    Property::TableRowCount,
    Property::ArrayCount,
    Property::ArrayEntryIndexed,
    Property::ArgumentsFilter,
    Property::ArgumentsGroupBy,
    Property::ArgumentsGroupColumns,
    Property::ArgumentsSortColumn,
    Property::ArgumentsSortOrder,
    Property::ArgumentsTimeStart,
    Property::ArgumentsTimeEnd,
    Property::ArgumentsSummary,
    Property::ArgumentsStringFilter,
    Property::ArgumentsTrackId,
    Property::FutureResult,
    Property::FutureType,
    Property::FutureObject,
    Property::SummaryMetricsGfxUtil,
    Property::SummaryMetricsMemUtil,
    Property::SummaryMetricsKernelExecTimeTotal,
    Property::SummaryMetricsTopKernelCount,
    Property::SummaryMetricsTopKernelName,
    Property::SummaryMetricsTopKernelExecTimeSum,
    Property::SummaryMetricsTopKernelExecTimePct,
    Property::SummaryMetricsTopKernelInvocations,
    Property::SummaryRoot,
    Property::SummaryChildCount,
    Property::SummaryChild,
    Property::PlotTrack,
    Property::PlotKind,
    Property::WorkloadName,
    Property::WorkloadKernelCount,
    Property::KernelName,
    Property::KernelDurationNs,
    Property::RooflineArithmeticIntensity,
    Property::RooflineAchievedFlops,
    Property::TopologyRootChildCount,
    Property::TopologyRootChild,
    Property::NodeId,
    Property::NodeName,
    Property::NodeProcessCount,
    Property::NodeProcessorCount,
    Property::ProcessId,
    Property::ProcessName,
    Property::ProcessParentNode,
    Property::ProcessThreadCount,
    Property::ProcessQueueCount,
    Property::ProcessorId,
    Property::ProcessorName,
    Property::ProcessorParentNode,
    Property::ProcessorStreamCount,
    Property::ProcessorCounterCount,
    Property::ThreadId,
    Property::ThreadParentProcess,
    Property::QueueId,
    Property::QueueParentProcess,
    Property::StreamId,
    Property::StreamParentProcessor,
    Property::CounterId,
    Property::CounterParentProcessor,
    Property::CounterName,
    Property::FlowControlSourceEventId,
    Property::FlowControlTargetEventId,
    Property::CallStackDepth,
    Property::CallStackFrame,
    Property::EventChildrenEntry,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_kind_per_property() {
        assert_eq!(Property::TrackMinTimestamp.kind_range(), Some(HandleKind::Track));
        assert_eq!(Property::GraphLodTier.kind_range(), Some(HandleKind::Graph));
        assert_ne!(Property::TrackMinTimestamp.kind_range(), Property::GraphLodTier.kind_range());
    }

    #[test]
    fn common_properties_have_no_single_kind() {
        assert_eq!(Property::CommonMemoryUsageInclusive.kind_range(), None);
        assert!(Property::CommonMemoryUsageInclusive.is_common());
    }

    #[test]
    fn from_u32_round_trips_every_table_entry() {
        for p in PROPERTY_TABLE {
            assert_eq!(Property::from_u32(*p as u32), Some(*p));
        }
        assert_eq!(Property::from_u32(999_999), None);
    }
}
