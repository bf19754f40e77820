//! A bounded worker-thread pool implementing [`JobScheduler`]: a single
//! FIFO queue guarded by a mutex/condvar, `hardware_concurrency()`
//! workers, cooperative cancellation (`spec.md` §4.2).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use trace_domain::entities::handle::HandleId;
use trace_domain::error::{Error, Result};
use trace_domain::ports::jobs::{Job, JobOutcome, JobScheduler, ScheduledJobId};
use trace_domain::value_objects::status::AbiStatus;

struct QueuedJob {
    id: ScheduledJobId,
    future: HandleId,
    job: Box<dyn Job>,
    cancelled: Arc<AtomicBool>,
}

struct JobSlot {
    outcome: Mutex<Option<JobOutcome>>,
    condvar: Condvar,
    cancelled: Arc<AtomicBool>,
}

/// The worker-pool adapter. Teardown drains the queue (cancelling
/// remaining jobs) and joins every worker, matching the original
/// `JobSystem` destructor.
pub struct WorkerPoolJobSystem {
    queue: Arc<Mutex<VecDeque<QueuedJob>>>,
    queue_cv: Arc<Condvar>,
    terminate: Arc<AtomicBool>,
    next_id: AtomicU64,
    slots: Arc<Mutex<std::collections::HashMap<u64, Arc<JobSlot>>>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPoolJobSystem {
    /// Spawn `worker_count` worker threads (defaults to
    /// `std::thread::available_parallelism()` when `worker_count` is `None`).
    #[must_use]
    pub fn new(worker_count: Option<usize>) -> Self {
        let queue: Arc<Mutex<VecDeque<QueuedJob>>> = Arc::new(Mutex::new(VecDeque::new()));
        let queue_cv = Arc::new(Condvar::new());
        let terminate = Arc::new(AtomicBool::new(false));
        let slots = Arc::new(Mutex::new(std::collections::HashMap::new()));

        let thread_count = worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(1)
        });

        let mut workers = Vec::with_capacity(thread_count);
        for worker_index in 0..thread_count {
            let queue = Arc::clone(&queue);
            let queue_cv = Arc::clone(&queue_cv);
            let terminate = Arc::clone(&terminate);
            let slots = Arc::clone(&slots);
            workers.push(
                std::thread::Builder::new()
                    .name(format!("trace-worker-{worker_index}"))
                    .spawn(move || worker_loop(&queue, &queue_cv, &terminate, &slots))
                    .expect("failed to spawn worker thread"),
            );
        }

        Self {
            queue,
            queue_cv,
            terminate,
            next_id: AtomicU64::new(1),
            slots,
            workers,
        }
    }
}

fn worker_loop(
    queue: &Arc<Mutex<VecDeque<QueuedJob>>>,
    queue_cv: &Arc<Condvar>,
    terminate: &Arc<AtomicBool>,
    slots: &Arc<Mutex<std::collections::HashMap<u64, Arc<JobSlot>>>>,
) {
    loop {
        let queued = {
            let mut guard = queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            loop {
                if terminate.load(Ordering::Acquire) && guard.is_empty() {
                    return;
                }
                if let Some(job) = guard.pop_front() {
                    break job;
                }
                guard = queue_cv.wait(guard).unwrap_or_else(std::sync::PoisonError::into_inner);
            }
        };

        let cancelled = queued.cancelled.clone();
        debug!(job_id = queued.id.0, "job starting");
        let outcome = if cancelled.load(Ordering::Acquire) {
            JobOutcome::Cancelled
        } else {
            queued.job.run(&|| cancelled.load(Ordering::Acquire))
        };
        debug!(job_id = queued.id.0, "job finished");

        let slot = {
            let guard = slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.get(&queued.id.0).cloned()
        };
        if let Some(slot) = slot {
            let mut stored = slot.outcome.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            *stored = Some(outcome);
            slot.condvar.notify_all();
        }
    }
}

impl JobScheduler for WorkerPoolJobSystem {
    fn issue(&self, future: HandleId, job: Box<dyn Job>) -> Result<ScheduledJobId> {
        let id = ScheduledJobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancelled = Arc::new(AtomicBool::new(false));
        let slot = Arc::new(JobSlot {
            outcome: Mutex::new(None),
            condvar: Condvar::new(),
            cancelled: Arc::clone(&cancelled),
        });

        {
            let mut slots = self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            slots.insert(id.0, slot);
        }
        {
            let mut queue = self.queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            queue.push_back(QueuedJob { id, future, job, cancelled });
        }
        self.queue_cv.notify_one();
        Ok(id)
    }

    fn cancel(&self, job: ScheduledJobId) -> Result<()> {
        let mut queue = self.queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(pos) = queue.iter().position(|q| q.id == job) {
            let queued = queue.remove(pos).expect("position was just found");
            queued.cancelled.store(true, Ordering::Release);
            drop(queue);
            let slots = self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(slot) = slots.get(&job.0) {
                let mut stored = slot.outcome.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                *stored = Some(JobOutcome::Cancelled);
                slot.condvar.notify_all();
            }
            return Ok(());
        }
        drop(queue);
        // Already running or finished: flip the flag a running worker polls.
        let slots = self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match slots.get(&job.0) {
            Some(slot) => {
                slot.cancelled.store(true, Ordering::Release);
                Ok(())
            }
            None => Err(Error::invalid_argument("unknown job id")),
        }
    }

    fn wait(&self, job: ScheduledJobId, timeout_ms: Option<u64>) -> Result<JobOutcome> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            slots
                .get(&job.0)
                .cloned()
                .ok_or_else(|| Error::invalid_argument("unknown job id"))?
        };

        let mut guard = slot.outcome.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        loop {
            if let Some(outcome) = guard.take() {
                // Put it back so a second `wait` after completion still observes it.
                let observed = match &outcome {
                    JobOutcome::Success(d) => JobOutcome::Success(d.clone()),
                    JobOutcome::Failed(s) => JobOutcome::Failed(*s),
                    JobOutcome::Cancelled => JobOutcome::Cancelled,
                };
                *guard = Some(outcome);
                return Ok(observed);
            }
            match timeout_ms {
                None => {
                    guard = slot.condvar.wait(guard).unwrap_or_else(std::sync::PoisonError::into_inner);
                }
                Some(ms) => {
                    let (next_guard, timeout_result) = slot
                        .condvar
                        .wait_timeout(guard, Duration::from_millis(ms))
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    guard = next_guard;
                    if timeout_result.timed_out() && guard.is_none() {
                        return Err(Error::Timeout);
                    }
                }
            }
        }
    }
}

impl Drop for WorkerPoolJobSystem {
    fn drop(&mut self) {
        {
            let mut queue = self.queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            for queued in queue.drain(..) {
                queued.cancelled.store(true, Ordering::Release);
            }
            self.terminate.store(true, Ordering::Release);
        }
        self.queue_cv.notify_all();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("job worker thread panicked during shutdown");
            }
        }
    }
}

/// Maps an outcome to the ABI status the controller future resolves with.
#[must_use]
pub fn outcome_status(outcome: &JobOutcome) -> AbiStatus {
    match outcome {
        JobOutcome::Success(_) => AbiStatus::Success,
        JobOutcome::Failed(status) => *status,
        JobOutcome::Cancelled => AbiStatus::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_domain::value_objects::data::Data;

    struct Echo(u64);
    impl Job for Echo {
        fn run(self: Box<Self>, _is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
            JobOutcome::Success(Data::UInt64(self.0))
        }
    }

    struct Spin;
    impl Job for Spin {
        fn run(self: Box<Self>, is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
            loop {
                if is_cancelled() {
                    return JobOutcome::Cancelled;
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    #[test]
    fn issue_and_wait_round_trips_result() {
        let pool = WorkerPoolJobSystem::new(Some(2));
        let id = pool.issue(HandleId::new(0), Box::new(Echo(42))).unwrap();
        let outcome = pool.wait(id, Some(5_000)).unwrap();
        assert!(matches!(outcome, JobOutcome::Success(Data::UInt64(42))));
    }

    #[test]
    fn cancel_before_start_never_invokes_job_function() {
        let pool = WorkerPoolJobSystem::new(Some(0));
        // Zero workers: the job can never dequeue itself, so cancel always
        // finds it still queued (`spec.md` §8 property 6).
        struct Never;
        impl Job for Never {
            fn run(self: Box<Self>, _is_cancelled: &dyn Fn() -> bool) -> JobOutcome {
                panic!("must never run once cancelled before start");
            }
        }
        let id = pool.issue(HandleId::new(0), Box::new(Never)).unwrap();
        pool.cancel(id).unwrap();
        let outcome = pool.wait(id, Some(100)).unwrap();
        assert!(matches!(outcome, JobOutcome::Cancelled));
    }

    #[test]
    fn cancel_while_running_is_observed_cooperatively() {
        let pool = WorkerPoolJobSystem::new(Some(1));
        let id = pool.issue(HandleId::new(0), Box::new(Spin)).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        pool.cancel(id).unwrap();
        let outcome = pool.wait(id, Some(5_000)).unwrap();
        assert!(matches!(outcome, JobOutcome::Cancelled));
    }
}
