//! The storage interface: an abstract collaborator over the trace
//! database (`spec.md` §4.3). The core depends only on this trait; the
//! SQL dialect and on-disk schema stay behind it.

use async_trait::async_trait;

use crate::entities::table::Column;
use crate::error::Result;
use crate::value_objects::data::Data;

/// File-type hint passed to `open`/`identify_type` (`spec.md` §4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaHint {
    RocpdSqlite,
    RocprofSqlite,
    RocprofMultinode,
    Compute,
    Autodetect,
}

/// Opaque handle to an open storage-layer database, returned by
/// [`StorageInterface::open`]. The core never inspects its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DbHandle(pub u64);

/// Opaque handle to a storage-layer future, distinct from the job
/// system's own futures (`spec.md` §4.2 "dependent-future protocol").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageFutureId(pub u64);

/// The state of a storage-layer future, polled via [`StorageInterface::future_wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFutureState {
    Pending,
    Success,
    Cancelled,
    Failed,
}

/// A declarative column spec used by [`StorageInterface::build_table_query`]:
/// a SQL expression paired with the stable alias consumers bind by
/// (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub expression: String,
    pub alias: String,
}

/// The clauses a query builder composes from (`spec.md` §4.4).
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub columns: Vec<ColumnSpec>,
    pub from: String,
    pub joins: Vec<String>,
    pub filter: Option<String>,
    pub group_by: Vec<String>,
    pub order_by: Option<(String, bool)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Metadata populated by [`StorageInterface::read_metadata_async`]:
/// agents, queues, streams, processes, threads, counters, and the track
/// inventory (`spec.md` §4.3).
#[derive(Debug, Clone, Default)]
pub struct StorageMetadata {
    pub schema_version: u32,
    pub track_ids: Vec<u64>,
}

/// A result table as exposed by the storage layer: enumerable columns and
/// rows, before transcription into domain [`Table`](crate::entities::table::Table) handles.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Data>>,
    pub total_row_count: u64,
}

/// The abstract trace/database collaborator (`spec.md` §4.3).
///
/// Guarantees made to callers: every `_async` operation completes exactly
/// once; queries are schema-versioned so the core can fall back across
/// revisions; results expose enumerable columns and rows.
#[async_trait]
pub trait StorageInterface: Send + Sync {
    /// Sniff magic bytes and schema table names to classify a path.
    async fn identify_type(&self, path: &str) -> Result<SchemaHint>;

    /// Open a database at `path`, using `hint` when not `Autodetect`.
    async fn open(&self, path: &str, hint: SchemaHint) -> Result<DbHandle>;

    /// Populate agents, queues, streams, processes, threads, counters,
    /// and the track inventory for `db`.
    async fn read_metadata_async(&self, db: DbHandle) -> Result<StorageMetadata>;

    /// Compose a SQL statement from a declarative [`QuerySpec`]. The
    /// dialect lives entirely behind this call.
    fn build_table_query(&self, db: DbHandle, spec: &QuerySpec) -> Result<String>;

    /// Execute `sql` asynchronously, returning a future id to poll and,
    /// once resolved, a [`ResultTable`].
    async fn execute_query_async(&self, db: DbHandle, sql: &str, description: &str) -> Result<StorageFutureId>;

    /// Fetch the result of a completed query future.
    async fn query_result(&self, future: StorageFutureId) -> Result<ResultTable>;

    /// Stream the full-range query result for `sql` directly to a CSV file.
    async fn export_table_csv_async(&self, db: DbHandle, sql: &str, path: &str) -> Result<StorageFutureId>;

    /// Write a new storage file containing only rows intersecting
    /// `[start, end]`, preserving schema (`spec.md` §6 "Trim save").
    async fn trim_save_async(&self, db: DbHandle, start: u64, end: u64, out_path: &str) -> Result<StorageFutureId>;

    /// Poll a storage-layer future's state.
    async fn future_wait(&self, future: StorageFutureId) -> Result<StorageFutureState>;

    /// Cancel a storage-layer future; idempotent on an already-resolved one.
    async fn future_cancel(&self, future: StorageFutureId) -> Result<()>;

    /// Release a storage-layer future's bookkeeping state.
    async fn future_free(&self, future: StorageFutureId) -> Result<()>;
}
