//! Dependency wiring: a small explicit builder, not a registry —
//! there is exactly one storage backend, so construction is direct
//! rather than slice-registered (`spec.md` §10).

use std::sync::Arc;

use trace_application::jobs::WorkerPoolJobSystem;
use trace_domain::ports::jobs::JobScheduler;

use crate::config::EngineConfig;
use crate::memory_manager::LruManager;

/// The long-lived services a controller needs, assembled once at
/// startup and shared across every opened trace.
pub struct Services {
    pub config: EngineConfig,
    pub job_scheduler: Arc<dyn JobScheduler>,
    pub lru: Arc<LruManager>,
}

/// Builds a [`Services`] bundle from a loaded [`EngineConfig`].
pub struct ServicesBuilder {
    config: EngineConfig,
}

impl ServicesBuilder {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn build(self) -> Services {
        let job_scheduler: Arc<dyn JobScheduler> = Arc::new(WorkerPoolJobSystem::new(self.config.worker_threads));
        let lru = Arc::new(LruManager::new(self.config.soft_cache_cap_bytes, self.config.lru_sweep_cap));
        Services { config: self.config, job_scheduler, lru }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_wires_a_usable_job_scheduler() {
        let services = ServicesBuilder::new(EngineConfig::default()).build();
        assert!(Arc::strong_count(&services.job_scheduler) >= 1);
    }
}
