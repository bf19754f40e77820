//! The `Controller`: one opened trace, its arena, and the long-lived
//! services it shares with every job it issues. Mirrors
//! `rocprofvis_controller.cpp`'s per-trace `SystemTrace`/`ComputeTrace`
//! object, minus the manual reference counting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::runtime::Handle as RuntimeHandle;
use trace_application::string_index::StringIndex;
use trace_domain::entities::handle::{HandleId, HandleKind};
use trace_domain::entities::trace::Trace;
use trace_domain::error::{Error, Result};
use trace_domain::ports::jobs::{Job, JobScheduler, ScheduledJobId};
use trace_domain::ports::query::QueryFactory;
use trace_domain::ports::storage::{DbHandle, StorageInterface};
use trace_infrastructure::LruManager;

use crate::arena::HandleArena;

/// One opened trace and the services it was built with.
pub struct Controller {
    pub(crate) arena: HandleArena,
    pub(crate) root: HandleId,
    pub(crate) runtime: RuntimeHandle,
    pub(crate) storage: Arc<dyn StorageInterface>,
    pub(crate) query_factory: Arc<dyn QueryFactory>,
    pub(crate) job_scheduler: Arc<dyn JobScheduler>,
    pub(crate) lru: Arc<LruManager>,
    pub(crate) strings: StringIndex,
    pub(crate) db: Arc<Mutex<Option<DbHandle>>>,
    pub(crate) schema_version: Arc<AtomicU32>,
    /// Maps a caller-visible `Future` handle to the job scheduler's id,
    /// so `future_wait`/`future_cancel` can route through
    /// [`JobScheduler`] without exposing `ScheduledJobId` at the facade.
    pub(crate) jobs_by_future: Mutex<HashMap<HandleId, ScheduledJobId>>,
}

impl Controller {
    /// `controller_alloc`: allocate a controller root and register it as
    /// a caller-owned handle, without touching storage yet (`spec.md` §6:
    /// loading happens via the separate `controller_load_async` call).
    #[must_use]
    pub fn alloc(
        path: String,
        kind: HandleKind,
        runtime: RuntimeHandle,
        storage: Arc<dyn StorageInterface>,
        query_factory: Arc<dyn QueryFactory>,
        job_scheduler: Arc<dyn JobScheduler>,
        lru: Arc<LruManager>,
    ) -> Arc<Self> {
        let arena = HandleArena::new();
        let root = arena.insert(Box::new(Trace::new(kind, path)), true);
        Arc::new(Self {
            arena,
            root,
            runtime,
            storage,
            query_factory,
            job_scheduler,
            lru,
            strings: StringIndex::new(),
            db: Arc::new(Mutex::new(None)),
            schema_version: Arc::new(AtomicU32::new(0)),
            jobs_by_future: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn root(&self) -> HandleId {
        self.root
    }

    #[must_use]
    pub fn arena(&self) -> &HandleArena {
        &self.arena
    }

    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version.load(Ordering::Relaxed)
    }

    pub fn db_handle(&self) -> Result<DbHandle> {
        self.db.lock().unwrap_or_else(std::sync::PoisonError::into_inner).ok_or_else(|| Error::NotLoaded { resource: "database".into() })
    }

    /// Bind `job` to `future` and issue it onto the shared scheduler.
    pub(crate) fn issue(&self, future: HandleId, job: Box<dyn Job>) -> Result<()> {
        let scheduled = self.job_scheduler.issue(future, job)?;
        self.jobs_by_future.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(future, scheduled);
        Ok(())
    }

    pub(crate) fn scheduled_job_for(&self, future: HandleId) -> Result<ScheduledJobId> {
        self.jobs_by_future
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&future)
            .copied()
            .ok_or_else(|| Error::invalid_argument("future has no job issued against it"))
    }
}
