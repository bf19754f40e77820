//! `Job` implementations the facade issues onto the shared
//! [`trace_domain::ports::jobs::JobScheduler`]. Each job runs on a plain
//! worker thread and blocks on its one async storage call via a captured
//! `tokio::runtime::Handle`, mirroring how the original `JobSystem`
//! workers call back into synchronous database code
//! (`rocprofvis_controller_job_system.cpp`).

use std::sync::Arc;

use tokio::runtime::Handle as RuntimeHandle;
use trace_domain::entities::future::ControllerFuture;
use trace_domain::entities::handle::{Handle, HandleId};
use trace_domain::entities::{Array, CallStack, FlowControl};
use trace_domain::ports::jobs::{Job, JobOutcome};
use trace_domain::ports::storage::{DbHandle, StorageInterface};
use trace_domain::value_objects::data::Data;
use trace_domain::value_objects::status::AbiStatus;

use crate::arena::HandleArena;

/// Register `storage_future_id` as a dependent of the `ControllerFuture`
/// at `owner`, so a later `future_cancel` on it also cancels the
/// in-flight storage operation (`spec.md` §4.2).
fn register_dependent(arena: &HandleArena, owner: HandleId, storage_future_id: u64) {
    let _ = arena.with_mut(owner, |handle| {
        if let Some(f) = handle.as_any_mut().downcast_mut::<ControllerFuture>() {
            f.add_dependent_future(storage_future_id);
        }
    });
}

fn unregister_dependent(arena: &HandleArena, owner: HandleId, storage_future_id: u64) {
    let _ = arena.with_mut(owner, |handle| {
        if let Some(f) = handle.as_any_mut().downcast_mut::<ControllerFuture>() {
            f.remove_dependent_future(storage_future_id);
        }
    });
}

/// Runs `identify_type` + `open` + `read_metadata_async`, then stores the
/// resolved schema version and track inventory back onto the trace root.
pub struct LoadJob {
    pub arena: HandleArena,
    pub runtime: RuntimeHandle,
    pub storage: Arc<dyn StorageInterface>,
    pub path: String,
    pub trace_id: HandleId,
    pub db_slot: Arc<std::sync::Mutex<Option<DbHandle>>>,
    pub schema_version_slot: Arc<std::sync::atomic::AtomicU32>,
    /// The caller-visible controller future this job resolves; also the
    /// dependent-future registry since `open`/`read_metadata_async` don't
    /// expose a `StorageFutureId` of their own.
    pub future: HandleId,
}

impl Job for LoadJob {
    fn run(self: Box<Self>, is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
        if is_cancelled() {
            return JobOutcome::Cancelled;
        }
        register_dependent(&self.arena, self.future, self.trace_id.raw());
        let outcome = self.runtime.block_on(async {
            let hint = self.storage.identify_type(&self.path).await?;
            let db = self.storage.open(&self.path, hint).await?;
            let metadata = self.storage.read_metadata_async(db).await?;
            Ok::<_, trace_domain::error::Error>((db, metadata))
        });
        unregister_dependent(&self.arena, self.future, self.trace_id.raw());

        match outcome {
            Ok((db, metadata)) => {
                *self.db_slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(db);
                self.schema_version_slot.store(metadata.schema_version, std::sync::atomic::Ordering::Relaxed);
                let set = self.arena.with_mut(self.trace_id, |handle| {
                    if let Some(trace) = handle.as_any_mut().downcast_mut::<trace_domain::entities::trace::Trace>() {
                        trace.set_schema_version(metadata.schema_version);
                    }
                });
                if set.is_err() {
                    return JobOutcome::Failed(AbiStatus::UnknownError);
                }
                JobOutcome::Success(Data::UInt64(u64::from(metadata.schema_version)))
            }
            Err(e) => JobOutcome::Failed(e.to_status()),
        }
    }
}

/// Executes one composed query end to end and stores the rows as a root
/// [`Array`] handle, resolving to `Data::Object(Some(array_id))`.
pub struct QueryJob {
    pub arena: HandleArena,
    pub runtime: RuntimeHandle,
    pub storage: Arc<dyn StorageInterface>,
    pub db: DbHandle,
    pub sql: String,
    pub description: String,
    pub column_index: usize,
    /// The caller-visible controller future this job resolves.
    pub future: HandleId,
}

impl Job for QueryJob {
    fn run(self: Box<Self>, is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
        if is_cancelled() {
            return JobOutcome::Cancelled;
        }
        let outcome = self.runtime.block_on(async {
            let storage_future = self.storage.execute_query_async(self.db, &self.sql, &self.description).await?;
            register_dependent(&self.arena, self.future, storage_future.0);
            let result = self.storage.query_result(storage_future).await;
            unregister_dependent(&self.arena, self.future, storage_future.0);
            result
        });

        match outcome {
            Ok(table) => {
                let column = table.rows.iter().filter_map(|row| row.get(self.column_index).cloned()).collect::<Vec<_>>();
                let array_id = self.arena.insert(Box::new(Array::new(column)), true);
                JobOutcome::Success(Data::Object(Some(array_id)))
            }
            Err(e) => JobOutcome::Failed(e.to_status()),
        }
    }
}

/// Streams a query straight to a CSV file via the storage layer.
pub struct ExportCsvJob {
    pub arena: HandleArena,
    pub runtime: RuntimeHandle,
    pub storage: Arc<dyn StorageInterface>,
    pub db: DbHandle,
    pub sql: String,
    pub out_path: String,
    /// The caller-visible controller future this job resolves; also the
    /// dependent-future registry key while the export runs, since the
    /// real `StorageFutureId` isn't known until the call returns.
    pub future: HandleId,
}

impl Job for ExportCsvJob {
    fn run(self: Box<Self>, is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
        if is_cancelled() {
            return JobOutcome::Cancelled;
        }
        register_dependent(&self.arena, self.future, self.db.0);
        let outcome = self.runtime.block_on(self.storage.export_table_csv_async(self.db, &self.sql, &self.out_path));
        unregister_dependent(&self.arena, self.future, self.db.0);
        match outcome {
            Ok(_) => JobOutcome::Success(Data::UInt64(1)),
            Err(e) => JobOutcome::Failed(e.to_status()),
        }
    }
}

/// Writes a new trimmed storage file covering `[start, end]`.
pub struct TrimSaveJob {
    pub arena: HandleArena,
    pub runtime: RuntimeHandle,
    pub storage: Arc<dyn StorageInterface>,
    pub db: DbHandle,
    pub start: u64,
    pub end: u64,
    pub out_path: String,
    /// The caller-visible controller future this job resolves; also the
    /// dependent-future registry key while the trim-save runs.
    pub future: HandleId,
}

impl Job for TrimSaveJob {
    fn run(self: Box<Self>, is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
        if is_cancelled() {
            return JobOutcome::Cancelled;
        }
        register_dependent(&self.arena, self.future, self.db.0);
        let outcome = self.runtime.block_on(self.storage.trim_save_async(self.db, self.start, self.end, &self.out_path));
        unregister_dependent(&self.arena, self.future, self.db.0);
        match outcome {
            Ok(_) => JobOutcome::Success(Data::UInt64(1)),
            Err(e) => JobOutcome::Failed(e.to_status()),
        }
    }
}

/// Runs the data-flow query for one operation's event table and matches
/// `event_id`'s correlation group, exactly as [`QueryJob`] does for a
/// plain fetch but post-processing the two-column result into
/// [`FlowControl`] sub-handles instead of raw rows.
pub struct FlowFetchJob {
    pub arena: HandleArena,
    pub runtime: RuntimeHandle,
    pub storage: Arc<dyn StorageInterface>,
    pub db: DbHandle,
    pub sql: String,
    pub event_id: u64,
    pub future: HandleId,
}

/// Read the `(eventId, correlationId)` pairs a `QueryFamily::DataFlow`
/// query produces (column order fixed by the query factory).
fn correlation_rows(table: &trace_domain::ports::storage::ResultTable) -> Vec<(u64, u64)> {
    table
        .rows
        .iter()
        .filter_map(|row| Some((row.first()?.as_u64().ok()?, row.get(1)?.as_u64().ok()?)))
        .collect()
}

impl Job for FlowFetchJob {
    fn run(self: Box<Self>, is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
        if is_cancelled() {
            return JobOutcome::Cancelled;
        }
        let outcome = self.runtime.block_on(async {
            let storage_future = self.storage.execute_query_async(self.db, &self.sql, "data-flow fetch").await?;
            register_dependent(&self.arena, self.future, storage_future.0);
            let result = self.storage.query_result(storage_future).await;
            unregister_dependent(&self.arena, self.future, storage_future.0);
            result
        });

        match outcome {
            Ok(table) => {
                let rows = correlation_rows(&table);
                let edges = match rows.iter().find(|(id, _)| *id == self.event_id) {
                    Some(&(_, correlation_id)) => rows
                        .iter()
                        .filter(|(id, corr)| *id != self.event_id && *corr == correlation_id)
                        .map(|&(id, _)| {
                            let flow = FlowControl::new(HandleId::new(self.event_id), HandleId::new(id));
                            Data::Object(Some(self.arena.insert_borrowed(Box::new(flow))))
                        })
                        .collect(),
                    None => Vec::new(),
                };
                let array_id = self.arena.insert(Box::new(Array::new(edges)), true);
                JobOutcome::Success(Data::Object(Some(array_id)))
            }
            Err(e) => JobOutcome::Failed(e.to_status()),
        }
    }
}

/// Same data-flow query as [`FlowFetchJob`], but resolves to a single
/// [`CallStack`] sub-handle whose frames are the other event ids sharing
/// `event_id`'s correlation group, ordered by id. No dedicated
/// stack-frame table exists in this schema, so a frame here names the
/// correlated event rather than a `(file, line, symbol)` triple.
pub struct CallStackFetchJob {
    pub arena: HandleArena,
    pub runtime: RuntimeHandle,
    pub storage: Arc<dyn StorageInterface>,
    pub db: DbHandle,
    pub sql: String,
    pub event_id: u64,
    pub future: HandleId,
}

impl Job for CallStackFetchJob {
    fn run(self: Box<Self>, is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
        if is_cancelled() {
            return JobOutcome::Cancelled;
        }
        let outcome = self.runtime.block_on(async {
            let storage_future = self.storage.execute_query_async(self.db, &self.sql, "call-stack fetch").await?;
            register_dependent(&self.arena, self.future, storage_future.0);
            let result = self.storage.query_result(storage_future).await;
            unregister_dependent(&self.arena, self.future, storage_future.0);
            result
        });

        match outcome {
            Ok(table) => {
                let rows = correlation_rows(&table);
                let frames = match rows.iter().find(|(id, _)| *id == self.event_id) {
                    Some(&(_, correlation_id)) => {
                        let mut ids: Vec<u64> = rows.iter().filter(|(_, corr)| *corr == correlation_id).map(|&(id, _)| id).collect();
                        ids.sort_unstable();
                        ids.into_iter().map(|id| format!("event:{id}")).collect()
                    }
                    None => Vec::new(),
                };
                let stack_id = self.arena.insert_borrowed(Box::new(CallStack::new(frames)));
                JobOutcome::Success(Data::Object(Some(stack_id)))
            }
            Err(e) => JobOutcome::Failed(e.to_status()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::SqlitePool;
    use trace_domain::entities::handle::HandleKind;
    use trace_domain::ports::storage::SchemaHint;
    use trace_domain::value_objects::property::Property;
    use trace_providers::SqliteStorage;

    use super::*;

    async fn seed_with_correlation(path: &std::path::Path) {
        let opts = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await.unwrap();
        sqlx::query("CREATE TABLE rocpd_region (id INTEGER, correlation_id INTEGER)").execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO rocpd_region VALUES (1, 100)").execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO rocpd_region VALUES (2, 100)").execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO rocpd_region VALUES (3, 200)").execute(&pool).await.unwrap();
        pool.close().await;
    }

    async fn seed(path: &std::path::Path) {
        let opts = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await.unwrap();
        sqlx::query("CREATE TABLE rocpd_region (id INTEGER, track_id INTEGER, start_id INTEGER, end_id INTEGER, name_id INTEGER, category_id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO rocpd_region VALUES (1, 1, 1, 2, 5, 0)").execute(&pool).await.unwrap();
        pool.close().await;
    }

    #[test]
    fn query_job_deregisters_its_dependent_storage_future_once_resolved() {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.db");
        runtime.block_on(seed(&path));

        let storage: Arc<dyn trace_domain::ports::storage::StorageInterface> = Arc::new(SqliteStorage::new());
        let db = runtime.block_on(storage.open(path.to_str().unwrap(), SchemaHint::Autodetect)).unwrap();

        let arena = HandleArena::new();
        let future = arena.insert(Box::new(ControllerFuture::new(HandleId::new(0))), true);

        let job = Box::new(QueryJob {
            arena: arena.clone(),
            runtime: runtime.handle().clone(),
            storage,
            db,
            sql: "SELECT id, track_id FROM rocpd_region".to_string(),
            description: "test query".to_string(),
            column_index: 0,
            future,
        });

        let outcome = job.run(&|| false);
        assert!(matches!(outcome, JobOutcome::Success(_)));

        let dependents_left = arena
            .with(future, |handle| handle.as_any().downcast_ref::<ControllerFuture>().map(|f| f.dependents().to_vec()))
            .unwrap()
            .unwrap();
        assert!(dependents_left.is_empty(), "the storage future must be deregistered once it resolves");
    }

    #[test]
    fn load_job_registers_and_clears_its_dependent_around_the_blocking_open() {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.db");
        runtime.block_on(seed(&path));

        let storage: Arc<dyn trace_domain::ports::storage::StorageInterface> = Arc::new(SqliteStorage::new());
        let arena = HandleArena::new();
        let trace_id = arena.insert(Box::new(trace_domain::entities::trace::Trace::new(HandleKind::ControllerSystem, path.to_str().unwrap().to_string())), true);
        let future = arena.insert(Box::new(ControllerFuture::new(HandleId::new(0))), true);

        let job = Box::new(LoadJob {
            arena: arena.clone(),
            runtime: runtime.handle().clone(),
            storage,
            path: path.to_str().unwrap().to_string(),
            trace_id,
            db_slot: Arc::new(Mutex::new(None)),
            schema_version_slot: Arc::new(AtomicU32::new(0)),
            future,
        });

        let outcome = job.run(&|| false);
        assert!(matches!(outcome, JobOutcome::Success(_)));

        let dependents_left = arena
            .with(future, |handle| handle.as_any().downcast_ref::<ControllerFuture>().map(|f| f.dependents().to_vec()))
            .unwrap()
            .unwrap();
        assert!(dependents_left.is_empty());
    }

    #[test]
    fn flow_fetch_job_pairs_events_sharing_a_correlation_id() {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.db");
        runtime.block_on(seed_with_correlation(&path));

        let storage: Arc<dyn trace_domain::ports::storage::StorageInterface> = Arc::new(SqliteStorage::new());
        let db = runtime.block_on(storage.open(path.to_str().unwrap(), SchemaHint::Autodetect)).unwrap();

        let arena = HandleArena::new();
        let future = arena.insert(Box::new(ControllerFuture::new(HandleId::new(0))), true);

        let job = Box::new(FlowFetchJob {
            arena: arena.clone(),
            runtime: runtime.handle().clone(),
            storage,
            db,
            sql: "SELECT id, correlation_id FROM rocpd_region".to_string(),
            event_id: 1,
            future,
        });

        let outcome = job.run(&|| false);
        let JobOutcome::Success(Data::Object(Some(array_id))) = outcome else {
            panic!("expected a resolved array handle");
        };
        let len = arena.with(array_id, |h| h.as_any().downcast_ref::<Array>().map(Array::len)).unwrap().unwrap();
        assert_eq!(len, 1, "event 1 shares its correlation group with exactly one other event, and not itself");
    }

    #[test]
    fn call_stack_fetch_job_names_every_frame_in_the_correlation_group() {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.db");
        runtime.block_on(seed_with_correlation(&path));

        let storage: Arc<dyn trace_domain::ports::storage::StorageInterface> = Arc::new(SqliteStorage::new());
        let db = runtime.block_on(storage.open(path.to_str().unwrap(), SchemaHint::Autodetect)).unwrap();

        let arena = HandleArena::new();
        let future = arena.insert(Box::new(ControllerFuture::new(HandleId::new(0))), true);

        let job = Box::new(CallStackFetchJob {
            arena: arena.clone(),
            runtime: runtime.handle().clone(),
            storage,
            db,
            sql: "SELECT id, correlation_id FROM rocpd_region".to_string(),
            event_id: 1,
            future,
        });

        let outcome = job.run(&|| false);
        let JobOutcome::Success(Data::Object(Some(stack_id))) = outcome else {
            panic!("expected a resolved call-stack handle");
        };
        let depth = arena.with(stack_id, |h| h.get_u64(Property::CallStackDepth, 0)).unwrap().unwrap();
        assert_eq!(depth, 2, "the stack should name both events sharing the correlation group");
        let frame0 = arena.with(stack_id, |h| h.get_string(Property::CallStackFrame, 0)).unwrap().unwrap();
        assert_eq!(frame0, "event:1");
    }
}
