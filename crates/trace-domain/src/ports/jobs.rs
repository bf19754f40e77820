//! The job-scheduling port: the shape a worker-pool adapter must provide,
//! kept separate from its concrete thread-pool implementation (which
//! lives in `trace-application`) so domain-level orchestration never
//! depends on `std::thread` directly (`spec.md` §4.2).

use crate::entities::handle::HandleId;
use crate::error::Result;
use crate::value_objects::data::Data;
use crate::value_objects::status::AbiStatus;

/// The outcome a scheduled job resolves its future with.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Success(Data),
    Failed(AbiStatus),
    Cancelled,
}

/// A unit of work submitted to the job system. Implementors close over
/// whatever state (storage handle, query spec, output array) the job
/// needs and observe `is_cancelled` at the cooperative cancellation
/// points `spec.md` §5 names.
pub trait Job: Send {
    /// Run the job to completion, or bail out early once `is_cancelled`
    /// starts returning `true`.
    fn run(self: Box<Self>, is_cancelled: &dyn Fn() -> bool) -> JobOutcome;
}

/// The controller-future id a scheduled job resolves on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduledJobId(pub u64);

/// Port implemented by the worker-pool adapter (`spec.md` §4.2:
/// `Issue`/`Wait`/`Cancel` plus dependent-future propagation).
pub trait JobScheduler: Send + Sync {
    /// Enqueue `job`, bound to the controller future identified by
    /// `future`. Returns immediately; the job runs on a worker thread.
    fn issue(&self, future: HandleId, job: Box<dyn Job>) -> Result<ScheduledJobId>;

    /// Cooperatively cancel a scheduled job: dequeue it if still pending,
    /// or flip its cancellation flag if already running.
    fn cancel(&self, job: ScheduledJobId) -> Result<()>;

    /// Block the calling thread until `job` resolves or `timeout_ms`
    /// elapses (`None` waits indefinitely).
    fn wait(&self, job: ScheduledJobId, timeout_ms: Option<u64>) -> Result<JobOutcome>;
}
