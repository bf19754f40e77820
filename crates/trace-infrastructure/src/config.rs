//! Runtime configuration: memory budget factor, worker pool size,
//! soft cache cap, and LOD tier thresholds (`spec.md` §4.8, §4.6),
//! loaded via `figment` (TOML file + environment overlay).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use trace_domain::error::{Error, Result};

/// The tunables a full deployment exposes beyond the distilled spec's
/// fixed defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplier applied to the projected record byte count to derive
    /// the memory manager's budget (`spec.md` §4.8, default `2.0`).
    pub memory_budget_factor: f64,
    /// Worker pool size override; `None` uses `hardware_concurrency()`.
    pub worker_threads: Option<usize>,
    /// Soft cap, in bytes, that triggers LRU eviction sweeps.
    pub soft_cache_cap_bytes: u64,
    /// Base gap threshold (nanoseconds) LOD tiers scale from.
    pub lod_gap_base_ns: u64,
    /// Base duration threshold (nanoseconds) LOD tiers scale from.
    pub lod_duration_base_ns: u64,
    /// Maximum objects recorded evictable per LRU sweep (`spec.md` §4.8).
    pub lru_sweep_cap: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_budget_factor: 2.0,
            worker_threads: None,
            soft_cache_cap_bytes: 512 * 1024 * 1024,
            lod_gap_base_ns: 10,
            lod_duration_base_ns: 100,
            lru_sweep_cap: 1_000_000,
        }
    }
}

/// Load [`EngineConfig`] from defaults, overlaid by an optional TOML
/// file, overlaid by `TRACEVIS_*` environment variables.
pub fn load(toml_path: Option<&str>) -> Result<EngineConfig> {
    let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
    if let Some(path) = toml_path {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed("TRACEVIS_"));

    figment
        .extract()
        .map_err(|e| Error::Config { message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let config = load(None).unwrap();
        assert!((config.memory_budget_factor - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn toml_file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "memory_budget_factor = 3.5\n").unwrap();
        let config = load(Some(path.to_str().unwrap())).unwrap();
        assert!((config.memory_budget_factor - 3.5).abs() < f64::EPSILON);
    }
}
