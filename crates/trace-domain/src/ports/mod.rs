//! Port traits: the collaborator shapes the application/infrastructure
//! layers implement, kept free of any concrete I/O dependency.

pub mod jobs;
pub mod query;
pub mod storage;

pub use jobs::{Job, JobOutcome, JobScheduler, ScheduledJobId};
pub use query::{EventOperation, QueryBounds, QueryFactory, QueryFamily};
pub use storage::{ColumnSpec, DbHandle, QuerySpec, ResultTable, SchemaHint, StorageFutureId, StorageFutureState, StorageInterface, StorageMetadata};
