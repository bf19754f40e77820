//! # Providers Layer
//!
//! The one concrete storage backend: SQLite over `rocpd`/`rocprof`
//! schema generations, plus the query factory that composes
//! schema-version-gated statements against it.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`schema`] | Magic/table-name/version detection (`spec.md` §11) |
//! | [`query_factory`] | [`trace_domain::ports::query::QueryFactory`] implementation |
//! | [`storage`] | [`trace_domain::ports::storage::StorageInterface`] implementation over `sqlx` |

pub mod query_factory;
pub mod schema;
pub mod storage;

pub use query_factory::SqliteQueryFactory;
pub use storage::SqliteStorage;
