//! The entities addressed by the handle/property ABI (`spec.md` §3).

pub mod arguments;
pub mod array;
pub mod event;
pub mod flow;
pub mod future;
pub mod handle;
pub mod sample;
pub mod summary;
pub mod table;
pub mod topology;
pub mod trace;
pub mod track;

pub use arguments::Arguments;
pub use array::Array;
pub use event::{Event, EventChildren};
pub use flow::{CallStack, FlowControl};
pub use future::ControllerFuture;
pub use handle::{Handle, HandleId, HandleKind};
pub use sample::{Sample, SampleLod};
pub use summary::{Summary, SummaryMetrics};
pub use table::Table;
pub use topology::{Counter, Node, Process, Processor, Queue, Stream, Thread, TopologyRoot};
pub use trace::{Timeline, Trace};
pub use track::{Graph, Histogram, Track, TrackCategory, TrackKind};
