//! `SqliteStorage`: the [`StorageInterface`] implementation backed by
//! `sqlx`'s SQLite driver. Grounded on `rocprofvis_db_rocprof.cpp`'s
//! `RocprofDatabase` (open/metadata/query/trim-save over one connection
//! pool per opened file) and its `SaveTrimmedData` table-copy sweep.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Column as _, Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use trace_domain::entities::table::{Column, ColumnType};
use trace_domain::error::{Error, Result};
use trace_domain::ports::storage::{
    ColumnSpec, DbHandle, QuerySpec, ResultTable, SchemaHint, StorageFutureId, StorageFutureState, StorageInterface,
    StorageMetadata,
};
use trace_domain::value_objects::data::Data;

use crate::schema::{classify_tables, detect_schema_version, verify_sqlite_magic};

#[derive(Clone, Copy, PartialEq, Eq)]
enum FutureKind {
    Query,
    Export,
    TrimSave,
}

struct FutureEntry {
    kind: FutureKind,
    state: StorageFutureState,
    result: Option<ResultTable>,
}

/// SQLite-backed [`StorageInterface`]. One connection pool is opened per
/// `open` call and kept alive under the returned [`DbHandle`].
pub struct SqliteStorage {
    pools: Mutex<HashMap<u64, SqlitePool>>,
    next_db_id: AtomicU64,
    futures: Mutex<HashMap<u64, FutureEntry>>,
    next_future_id: AtomicU64,
}

impl Default for SqliteStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteStorage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: Mutex::new(HashMap::new()),
            next_db_id: AtomicU64::new(1),
            futures: Mutex::new(HashMap::new()),
            next_future_id: AtomicU64::new(1),
        }
    }

    async fn pool_for(&self, db: DbHandle) -> Result<SqlitePool> {
        self.pools
            .lock()
            .await
            .get(&db.0)
            .cloned()
            .ok_or_else(|| Error::not_supported(format!("no open database for handle {}", db.0)))
    }

    async fn insert_future(&self, kind: FutureKind, state: StorageFutureState, result: Option<ResultTable>) -> StorageFutureId {
        let id = self.next_future_id.fetch_add(1, Ordering::Relaxed);
        self.futures.lock().await.insert(id, FutureEntry { kind, state, result });
        StorageFutureId(id)
    }

    /// Build a `SELECT ... FROM ... JOIN ... WHERE ... GROUP BY ... ORDER BY ...` statement.
    fn render(spec: &QuerySpec) -> String {
        let select = spec
            .columns
            .iter()
            .map(|c: &ColumnSpec| format!("{} AS {}", c.expression, c.alias))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {select} FROM {}", spec.from);
        for join in &spec.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if let Some(filter) = &spec.filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        if !spec.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&spec.group_by.join(", "));
        }
        if let Some((column, ascending)) = &spec.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(column);
            sql.push_str(if *ascending { " ASC" } else { " DESC" });
        }
        if let Some(limit) = spec.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = spec.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    async fn run_query(pool: &SqlitePool, sql: &str) -> Result<ResultTable> {
        let rows = sqlx::query(sql)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::storage(e.to_string()))?;

        let Some(first) = rows.first() else {
            return Ok(ResultTable::default());
        };

        let columns: Vec<Column> = first
            .columns()
            .iter()
            .map(|c| Column { name: c.name().to_string(), column_type: ColumnType::String })
            .collect();

        let mut out_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(columns.len());
            for (idx, _) in columns.iter().enumerate() {
                let value: Option<i64> = row.try_get(idx).ok();
                let data = if let Some(v) = value {
                    Data::UInt64(v as u64)
                } else if let Ok(v) = row.try_get::<f64, _>(idx) {
                    Data::Double(v)
                } else {
                    let s: String = row.try_get(idx).unwrap_or_default();
                    Data::String(s)
                };
                values.push(data);
            }
            out_rows.push(values);
        }

        let total_row_count = out_rows.len() as u64;
        Ok(ResultTable { columns, rows: out_rows, total_row_count })
    }

    /// Re-insert one already-fetched row into `table` on `out_pool`,
    /// decoding each column the same way [`Self::run_query`] does.
    async fn copy_row(out_pool: &SqlitePool, table: &str, row: &sqlx::sqlite::SqliteRow) -> Result<()> {
        let columns = row.columns();
        let column_names: Vec<&str> = columns.iter().map(|c| c.name()).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let insert_sql = format!("INSERT INTO {table} ({}) VALUES ({placeholders})", column_names.join(", "));

        let mut query = sqlx::query(&insert_sql);
        for idx in 0..columns.len() {
            if let Ok(v) = row.try_get::<i64, _>(idx) {
                query = query.bind(v);
            } else if let Ok(v) = row.try_get::<f64, _>(idx) {
                query = query.bind(v);
            } else {
                let s: String = row.try_get(idx).unwrap_or_default();
                query = query.bind(s);
            }
        }
        query.execute(out_pool).await.map_err(|e| Error::storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl StorageInterface for SqliteStorage {
    #[instrument(skip(self))]
    async fn identify_type(&self, path: &str) -> Result<SchemaHint> {
        let header = tokio::fs::read(path).await.map_err(Error::from)?;
        verify_sqlite_magic(header.get(..16).unwrap_or(&header))?;

        let opts = SqliteConnectOptions::new().filename(path).read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| Error::storage(e.to_string()))?;

        let table_rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(&pool)
            .await
            .map_err(|e| Error::storage(e.to_string()))?;
        let table_names: Vec<String> = table_rows.iter().filter_map(|r| r.try_get::<String, _>(0).ok()).collect();

        let node_rows = sqlx::query("SELECT COUNT(DISTINCT nid) FROM rocpd_track")
            .fetch_optional(&pool)
            .await
            .ok()
            .flatten();
        let distinct_nodes: u32 = node_rows.and_then(|r| r.try_get::<i64, _>(0).ok()).unwrap_or(1) as u32;

        pool.close().await;
        Ok(classify_tables(&table_names, distinct_nodes))
    }

    #[instrument(skip(self))]
    async fn open(&self, path: &str, hint: SchemaHint) -> Result<DbHandle> {
        let resolved_hint = if matches!(hint, SchemaHint::Autodetect) { self.identify_type(path).await? } else { hint };
        debug!(?resolved_hint, path, "opening trace database");

        let opts = SqliteConnectOptions::new().filename(path).read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| Error::storage(e.to_string()))?;

        let id = self.next_db_id.fetch_add(1, Ordering::Relaxed);
        self.pools.lock().await.insert(id, pool);
        Ok(DbHandle(id))
    }

    #[instrument(skip(self))]
    async fn read_metadata_async(&self, db: DbHandle) -> Result<StorageMetadata> {
        let pool = self.pool_for(db).await?;

        let marker: Option<i64> =
            sqlx::query_scalar("SELECT value FROM rocpd_metadata WHERE key = 'schema_version'").fetch_optional(&pool).await.ok().flatten();
        let schema_version = detect_schema_version(marker);

        let track_rows = sqlx::query("SELECT id FROM rocpd_track")
            .fetch_all(&pool)
            .await
            .map_err(|e| Error::storage(e.to_string()))?;
        let track_ids = track_rows.iter().filter_map(|r| r.try_get::<i64, _>(0).ok()).map(|v| v as u64).collect();

        Ok(StorageMetadata { schema_version, track_ids })
    }

    fn build_table_query(&self, _db: DbHandle, spec: &QuerySpec) -> Result<String> {
        Ok(Self::render(spec))
    }

    #[instrument(skip(self, sql))]
    async fn execute_query_async(&self, db: DbHandle, sql: &str, description: &str) -> Result<StorageFutureId> {
        debug!(description, "executing query");
        let pool = self.pool_for(db).await?;
        let result = Self::run_query(&pool, sql).await;
        match result {
            Ok(table) => Ok(self.insert_future(FutureKind::Query, StorageFutureState::Success, Some(table)).await),
            Err(_) => Ok(self.insert_future(FutureKind::Query, StorageFutureState::Failed, None).await),
        }
    }

    async fn query_result(&self, future: StorageFutureId) -> Result<ResultTable> {
        let entry = self.futures.lock().await.remove(&future.0);
        match entry {
            Some(FutureEntry { kind: FutureKind::Query, state: StorageFutureState::Success, result: Some(table) }) => Ok(table),
            Some(FutureEntry { kind: FutureKind::Query, state: StorageFutureState::Cancelled, .. }) => Err(Error::Cancelled),
            Some(FutureEntry { kind: FutureKind::Query, .. }) => Err(Error::not_supported("query did not complete successfully")),
            Some(_) => Err(Error::invalid_argument("future is not a query future")),
            None => Err(Error::invalid_argument("unknown storage future")),
        }
    }

    #[instrument(skip(self, sql))]
    async fn export_table_csv_async(&self, db: DbHandle, sql: &str, path: &str) -> Result<StorageFutureId> {
        let pool = self.pool_for(db).await?;
        let table = Self::run_query(&pool, sql).await?;

        let mut writer =
            csv::WriterBuilder::new().terminator(csv::Terminator::Any(b'\n')).from_path(path).map_err(|e| Error::storage(e.to_string()))?;
        writer
            .write_record(table.columns.iter().map(|c| c.name.as_str()))
            .map_err(|e| Error::storage(e.to_string()))?;
        for row in &table.rows {
            let fields: Vec<String> = row
                .iter()
                .map(|data| match data {
                    Data::UInt64(v) => v.to_string(),
                    Data::Double(v) => v.to_string(),
                    Data::String(v) => v.clone(),
                    Data::Object(v) => v.map(|h| h.raw().to_string()).unwrap_or_default(),
                })
                .collect();
            writer.write_record(&fields).map_err(|e| Error::storage(e.to_string()))?;
        }
        writer.flush().map_err(Error::from)?;

        Ok(self.insert_future(FutureKind::Export, StorageFutureState::Success, None).await)
    }

    #[instrument(skip(self))]
    async fn trim_save_async(&self, db: DbHandle, start: u64, end: u64, out_path: &str) -> Result<StorageFutureId> {
        let pool = self.pool_for(db).await?;

        let table_rows = sqlx::query("SELECT name, sql FROM sqlite_master WHERE type = 'table' AND sql IS NOT NULL")
            .fetch_all(&pool)
            .await
            .map_err(|e| Error::storage(e.to_string()))?;

        let out_opts = SqliteConnectOptions::new().filename(out_path).create_if_missing(true);
        let out_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(out_opts)
            .await
            .map_err(|e| Error::storage(e.to_string()))?;

        for row in &table_rows {
            let name: String = row.try_get(0).unwrap_or_default();
            let create_sql: String = row.try_get(1).unwrap_or_default();
            sqlx::query(&create_sql).execute(&out_pool).await.map_err(|e| Error::storage(e.to_string()))?;

            let has_timestamp = name == "rocpd_timestamp";
            let select = if has_timestamp {
                format!("SELECT * FROM {name} WHERE value >= {start} AND value <= {end}")
            } else {
                format!("SELECT * FROM {name}")
            };
            let source_rows = sqlx::query(&select).fetch_all(&pool).await.map_err(|e| Error::storage(e.to_string()))?;
            for source_row in &source_rows {
                Self::copy_row(&out_pool, &name, source_row).await?;
            }
            debug!(table = name.as_str(), copied = source_rows.len(), "trim-save copied table");
        }
        out_pool.close().await;

        Ok(self.insert_future(FutureKind::TrimSave, StorageFutureState::Success, None).await)
    }

    async fn future_wait(&self, future: StorageFutureId) -> Result<StorageFutureState> {
        self.futures.lock().await.get(&future.0).map(|e| e.state).ok_or_else(|| Error::invalid_argument("unknown storage future"))
    }

    async fn future_cancel(&self, future: StorageFutureId) -> Result<()> {
        if let Some(entry) = self.futures.lock().await.get_mut(&future.0) {
            if entry.state == StorageFutureState::Pending {
                entry.state = StorageFutureState::Cancelled;
            }
        }
        Ok(())
    }

    async fn future_free(&self, future: StorageFutureId) -> Result<()> {
        self.futures.lock().await.remove(&future.0);
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").finish_non_exhaustive()
    }
}

/// Shared-ownership convenience alias used by [`crate::di`] wiring.
pub type SharedStorage = Arc<SqliteStorage>;
