//! # Server Layer
//!
//! The flat controller-ABI surface (`spec.md` §6): a handle arena, the
//! background jobs issued against it, the per-trace `Controller` that
//! ties storage/query/job-scheduling services together, and the facade
//! functions a caller actually invokes.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`arena`] | `dashmap`-backed handle registry with root/borrowed ownership |
//! | [`jobs`] | `Job` implementations for load/query/export/trim-save |
//! | [`controller`] | Per-trace service bundle: arena, storage, query factory, scheduler |
//! | [`facade`] | The ABI-named entry points (`controller_*`, `get_*`/`set_*`, `free`) |

pub mod arena;
pub mod controller;
pub mod facade;
pub mod jobs;

pub use arena::HandleArena;
pub use controller::Controller;
