//! Schema-version and file-type detection (`spec.md` §11, supplemented
//! from `rocprofvis_db_rocprof.cpp`'s schema-version marker read and
//! `identify_type`'s magic + table-name sniff).

use trace_domain::error::{Error, Result};
use trace_domain::ports::storage::SchemaHint;

/// SQLite's fixed 16-byte header magic.
const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Schema version at and above which queries use the relational
/// `rocpd_track`/`rocpd_timestamp` join path (`spec.md` §4.4).
pub const RELATIONAL_JOIN_MIN_VERSION: u32 = 4;

/// Read the SQLite header and confirm it is actually a SQLite database.
pub fn verify_sqlite_magic(header: &[u8]) -> Result<()> {
    if header.len() < SQLITE_MAGIC.len() || &header[..SQLITE_MAGIC.len()] != SQLITE_MAGIC {
        return Err(Error::not_supported("not a SQLite database file"));
    }
    Ok(())
}

/// Classify a database by the table names present in `sqlite_master`
/// (`spec.md` §11): `rocpd_*` tables mean the modern `RocpdSqlite`
/// schema; legacy `rocprof_*` tables (with more than one distinct
/// node id) mean `RocprofMultinode`; a single node means `RocprofSqlite`.
pub fn classify_tables(table_names: &[String], distinct_node_count: u32) -> SchemaHint {
    let has_rocpd = table_names.iter().any(|t| t.starts_with("rocpd_"));
    if has_rocpd {
        return SchemaHint::RocpdSqlite;
    }
    if distinct_node_count > 1 {
        SchemaHint::RocprofMultinode
    } else {
        SchemaHint::RocprofSqlite
    }
}

/// Parse the stored `schema_version` marker row. The original reads it
/// as a single integer value from a dedicated metadata table; callers
/// pass in whatever scalar was read (`None` when the table/row is absent,
/// which is treated as the oldest supported version).
#[must_use]
pub fn detect_schema_version(marker_value: Option<i64>) -> u32 {
    marker_value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}

/// `true` when `version` should use the relational join query path.
#[must_use]
pub fn uses_relational_join(version: u32) -> bool {
    version >= RELATIONAL_JOIN_MIN_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_mismatch_is_not_supported() {
        assert!(verify_sqlite_magic(b"not a db").is_err());
    }

    #[test]
    fn rocpd_tables_win_over_legacy_naming() {
        let tables = vec!["rocpd_info".to_string(), "rocprof_other".to_string()];
        assert_eq!(classify_tables(&tables, 1), SchemaHint::RocpdSqlite);
    }

    #[test]
    fn multinode_detected_by_distinct_node_count() {
        let tables = vec!["rocprof_samples".to_string()];
        assert_eq!(classify_tables(&tables, 3), SchemaHint::RocprofMultinode);
    }

    #[test]
    fn missing_marker_falls_back_to_version_zero() {
        assert_eq!(detect_schema_version(None), 0);
        assert!(!uses_relational_join(0));
        assert!(uses_relational_join(4));
    }
}
