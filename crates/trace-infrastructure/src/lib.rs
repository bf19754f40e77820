//! # Infrastructure Layer
//!
//! Concrete adapters that depend on both domain and application: config
//! loading, logging initialization, the bitmap-pool memory manager with
//! its LRU eviction thread, and the dependency-injection wiring that
//! assembles a controller's long-lived services.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`config`] | `figment`-based `EngineConfig` loader (TOML + env overlay) |
//! | [`logging`] | `tracing-subscriber` initialization |
//! | [`memory_manager`] | Safe-Rust bitmap pool + LRU eviction thread (`spec.md` §4.8) |
//! | [`di`] | Explicit service builder (`spec.md` §10) |

pub mod config;
pub mod di;
pub mod logging;
pub mod memory_manager;

pub use config::EngineConfig;
pub use di::{Services, ServicesBuilder};
pub use memory_manager::{LruManager, MemoryPool};
