//! End-to-end coverage of `SqliteStorage` against a real on-disk SQLite
//! file: identify, open, read metadata, query, export, trim-save.

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;

use trace_domain::ports::storage::{SchemaHint, StorageInterface};
use trace_providers::SqliteStorage;

async fn exec(pool: &SqlitePool, sql: &str) {
    sqlx::query(sql).execute(pool).await.unwrap();
}

async fn seed_fixture(path: &std::path::Path) {
    let opts = SqliteConnectOptions::new().filename(path).create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await.unwrap();

    exec(&pool, "CREATE TABLE rocpd_metadata (key TEXT, value INTEGER)").await;
    exec(&pool, "INSERT INTO rocpd_metadata VALUES ('schema_version', 4)").await;

    exec(&pool, "CREATE TABLE rocpd_track (id INTEGER, nid INTEGER)").await;
    exec(&pool, "INSERT INTO rocpd_track VALUES (1, 0), (2, 0)").await;

    exec(&pool, "CREATE TABLE rocpd_timestamp (id INTEGER, value INTEGER)").await;
    exec(&pool, "INSERT INTO rocpd_timestamp VALUES (1, 10), (2, 20), (3, 30), (4, 40)").await;

    exec(
        &pool,
        "CREATE TABLE rocpd_region (id INTEGER, track_id INTEGER, start_id INTEGER, end_id INTEGER, name_id INTEGER, category_id INTEGER)",
    )
    .await;
    exec(&pool, "INSERT INTO rocpd_region VALUES (1, 1, 1, 2, 5, 0), (2, 1, 3, 4, 6, 0)").await;

    pool.close().await;
}

#[tokio::test]
async fn identify_open_and_read_metadata_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.db");
    seed_fixture(&path).await;

    let storage = SqliteStorage::new();
    let path_str = path.to_str().unwrap();

    let hint = storage.identify_type(path_str).await.unwrap();
    assert_eq!(hint, SchemaHint::RocpdSqlite);

    let db = storage.open(path_str, hint).await.unwrap();
    let metadata = storage.read_metadata_async(db).await.unwrap();
    assert_eq!(metadata.schema_version, 4);
    assert_eq!(metadata.track_ids.len(), 2);
}

#[tokio::test]
async fn query_and_export_csv_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.db");
    seed_fixture(&path).await;

    let storage = SqliteStorage::new();
    let path_str = path.to_str().unwrap();
    let db = storage.open(path_str, SchemaHint::Autodetect).await.unwrap();

    let sql = "SELECT id, track_id FROM rocpd_region ORDER BY id";
    let future = storage.execute_query_async(db, sql, "regions").await.unwrap();
    let table = storage.query_result(future).await.unwrap();
    assert_eq!(table.rows.len(), 2);

    let out_path = dir.path().join("out.csv");
    storage.export_table_csv_async(db, sql, out_path.to_str().unwrap()).await.unwrap();
    let contents = std::fs::read_to_string(&out_path).unwrap();
    assert!(contents.lines().count() >= 3, "expected a header row plus two data rows");
}

#[tokio::test]
async fn trim_save_keeps_only_timestamps_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.db");
    seed_fixture(&path).await;

    let storage = SqliteStorage::new();
    let path_str = path.to_str().unwrap();
    let db = storage.open(path_str, SchemaHint::Autodetect).await.unwrap();

    let out_path = dir.path().join("trimmed.db");
    storage.trim_save_async(db, 15, 35, out_path.to_str().unwrap()).await.unwrap();

    let out_pool = SqlitePool::connect(&format!("sqlite://{}", out_path.to_str().unwrap())).await.unwrap();
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rocpd_timestamp").fetch_one(&out_pool).await.unwrap();
    assert_eq!(remaining, 2, "only timestamps 20 and 30 fall in [15, 35]");
    out_pool.close().await;
}
