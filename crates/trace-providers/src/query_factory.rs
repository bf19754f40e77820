//! [`QueryFactory`] implementation: composes a [`QuerySpec`] per
//! `(operation, family)` pair, gated on schema version exactly the way
//! `rocprofvis_db_query_factory.cpp`'s `IsVersionGreaterOrEqual("4")`
//! branches choose between the relational `rocpd_track`/`rocpd_timestamp`
//! join and inline columns on the event tables themselves.

use trace_domain::error::{Error, Result};
use trace_domain::ports::query::{alias, EventOperation, QueryBounds, QueryFactory, QueryFamily};
use trace_domain::ports::storage::{ColumnSpec, QuerySpec};

use crate::schema::uses_relational_join;

/// The relational-join table name for an [`EventOperation`] at schema
/// version ≥ [`crate::schema::RELATIONAL_JOIN_MIN_VERSION`].
fn event_table(operation: EventOperation) -> &'static str {
    match operation {
        EventOperation::Region | EventOperation::RegionSample => "rocpd_region",
        EventOperation::Dispatch => "rocpd_kernel_dispatch",
        EventOperation::MemAlloc => "rocpd_memory_allocate",
        EventOperation::MemCopy => "rocpd_memory_copy",
        EventOperation::PmcPerDispatch => "rocpd_pmc_dispatch",
        EventOperation::PmcSample => "rocpd_pmc_sample",
    }
}

/// Columns an event table carries inline, used verbatim below schema
/// version 4 and qualified through a join at version ≥ 4.
struct EventColumns {
    node: &'static str,
    process_or_agent: &'static str,
    thread_or_queue: &'static str,
}

fn event_columns(operation: EventOperation) -> EventColumns {
    match operation {
        EventOperation::Region | EventOperation::RegionSample | EventOperation::MemAlloc | EventOperation::MemCopy => {
            EventColumns { node: "nid", process_or_agent: "pid", thread_or_queue: "tid" }
        }
        EventOperation::Dispatch | EventOperation::PmcPerDispatch | EventOperation::PmcSample => {
            EventColumns { node: "nid", process_or_agent: "agent_id", thread_or_queue: "queue_id" }
        }
    }
}

/// SQLite-dialect [`QueryFactory`]: every emission path binds to the
/// same [`alias`] constants regardless of which schema generation it
/// reads from.
#[derive(Debug, Default)]
pub struct SqliteQueryFactory;

impl SqliteQueryFactory {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn apply_bounds(spec: &mut QuerySpec, bounds: &QueryBounds, track_column: &str) {
        let mut clauses = Vec::new();
        if !bounds.track_ids.is_empty() {
            let ids = bounds.track_ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
            clauses.push(format!("{track_column} IN ({ids})"));
        }
        if let Some(start) = bounds.time_start {
            clauses.push(format!("{} >= {start}", alias::START_TS));
        }
        if let Some(end) = bounds.time_end {
            clauses.push(format!("{} <= {end}", alias::END_TS));
        }
        if !clauses.is_empty() {
            spec.filter = Some(clauses.join(" AND "));
        }
    }

    fn compose_track_enumeration(version: u32, operation: EventOperation) -> QuerySpec {
        let table = event_table(operation);
        let cols = event_columns(operation);
        if uses_relational_join(version) {
            QuerySpec {
                columns: vec![
                    ColumnSpec { expression: format!("T.{}", cols.node), alias: alias::NODE_ID.to_string() },
                    ColumnSpec {
                        expression: format!("T.{}", cols.process_or_agent),
                        alias: alias::PROCESS_ID.to_string(),
                    },
                    ColumnSpec {
                        expression: format!("T.{}", cols.thread_or_queue),
                        alias: alias::THREAD_ID.to_string(),
                    },
                ],
                from: format!("{table} E"),
                joins: vec!["INNER JOIN rocpd_track T ON T.id = E.track_id".to_string()],
                group_by: vec![alias::NODE_ID.into(), alias::PROCESS_ID.into(), alias::THREAD_ID.into()],
                ..QuerySpec::default()
            }
        } else {
            QuerySpec {
                columns: vec![
                    ColumnSpec { expression: cols.node.to_string(), alias: alias::NODE_ID.to_string() },
                    ColumnSpec { expression: cols.process_or_agent.to_string(), alias: alias::PROCESS_ID.to_string() },
                    ColumnSpec { expression: cols.thread_or_queue.to_string(), alias: alias::THREAD_ID.to_string() },
                ],
                from: format!("{table} E"),
                group_by: vec![alias::NODE_ID.into(), alias::PROCESS_ID.into(), alias::THREAD_ID.into()],
                ..QuerySpec::default()
            }
        }
    }

    fn compose_level_source(version: u32, operation: EventOperation) -> QuerySpec {
        let table = event_table(operation);
        if uses_relational_join(version) {
            QuerySpec {
                columns: vec![
                    ColumnSpec { expression: "TS.value".to_string(), alias: alias::START_TS.to_string() },
                    ColumnSpec { expression: "TE.value".to_string(), alias: alias::END_TS.to_string() },
                    ColumnSpec { expression: "E.id".to_string(), alias: "eventId".to_string() },
                ],
                from: format!("{table} E"),
                joins: vec![
                    "INNER JOIN rocpd_timestamp TS ON TS.id = E.start_id".to_string(),
                    "INNER JOIN rocpd_timestamp TE ON TE.id = E.end_id".to_string(),
                ],
                order_by: Some((alias::START_TS.to_string(), true)),
                ..QuerySpec::default()
            }
        } else {
            QuerySpec {
                columns: vec![
                    ColumnSpec { expression: "start".to_string(), alias: alias::START_TS.to_string() },
                    ColumnSpec { expression: "end".to_string(), alias: alias::END_TS.to_string() },
                    ColumnSpec { expression: "id".to_string(), alias: "eventId".to_string() },
                ],
                from: format!("{table} E"),
                order_by: Some((alias::START_TS.to_string(), true)),
                ..QuerySpec::default()
            }
        }
    }

    fn compose_table(version: u32, operation: EventOperation) -> QuerySpec {
        let table = event_table(operation);
        if uses_relational_join(version) {
            QuerySpec {
                columns: vec![
                    ColumnSpec { expression: "TS.value".to_string(), alias: alias::START_TS.to_string() },
                    ColumnSpec { expression: "TE.value".to_string(), alias: alias::END_TS.to_string() },
                    ColumnSpec { expression: "E.name_id".to_string(), alias: alias::EVENT_NAME_ID.to_string() },
                    ColumnSpec { expression: "E.category_id".to_string(), alias: alias::CATEGORY_ID.to_string() },
                ],
                from: format!("{table} E"),
                joins: vec![
                    "INNER JOIN rocpd_timestamp TS ON TS.id = E.start_id".to_string(),
                    "INNER JOIN rocpd_timestamp TE ON TE.id = E.end_id".to_string(),
                ],
                ..QuerySpec::default()
            }
        } else {
            QuerySpec {
                columns: vec![
                    ColumnSpec { expression: "start".to_string(), alias: alias::START_TS.to_string() },
                    ColumnSpec { expression: "end".to_string(), alias: alias::END_TS.to_string() },
                    ColumnSpec { expression: "name_id".to_string(), alias: alias::EVENT_NAME_ID.to_string() },
                    ColumnSpec { expression: "category_id".to_string(), alias: alias::CATEGORY_ID.to_string() },
                ],
                from: format!("{table} E"),
                ..QuerySpec::default()
            }
        }
    }

    fn compose_essential_info(version: u32, operation: EventOperation) -> QuerySpec {
        let table = event_table(operation);
        let id_column = if uses_relational_join(version) { "E.id" } else { "id" };
        QuerySpec {
            columns: vec![ColumnSpec { expression: id_column.to_string(), alias: "eventId".to_string() }],
            from: format!("{table} E"),
            ..QuerySpec::default()
        }
    }

    fn compose_stream_regrouping(version: u32, operation: EventOperation) -> QuerySpec {
        let mut spec = Self::compose_level_source(version, operation);
        spec.columns.push(ColumnSpec { expression: "E.queue_id".to_string(), alias: alias::STREAM_ID.to_string() });
        spec.group_by = vec![alias::STREAM_ID.into()];
        spec
    }

    fn compose_data_flow(_version: u32, operation: EventOperation) -> QuerySpec {
        let table = event_table(operation);
        QuerySpec {
            columns: vec![
                ColumnSpec { expression: "E.id".to_string(), alias: "eventId".to_string() },
                ColumnSpec { expression: "E.correlation_id".to_string(), alias: "correlationId".to_string() },
            ],
            from: format!("{table} E"),
            ..QuerySpec::default()
        }
    }
}

impl QueryFactory for SqliteQueryFactory {
    fn compose(
        &self,
        schema_version: u32,
        operation: EventOperation,
        family: QueryFamily,
        bounds: &QueryBounds,
    ) -> Result<QuerySpec> {
        if matches!(operation, EventOperation::RegionSample) && matches!(family, QueryFamily::DataFlow) {
            return Err(Error::invalid_argument("sample regions do not participate in data-flow correlation"));
        }

        let mut spec = match family {
            QueryFamily::TrackEnumeration => Self::compose_track_enumeration(schema_version, operation),
            QueryFamily::StreamRegrouping => Self::compose_stream_regrouping(schema_version, operation),
            QueryFamily::LevelSource | QueryFamily::Slice => Self::compose_level_source(schema_version, operation),
            QueryFamily::Table => Self::compose_table(schema_version, operation),
            QueryFamily::DataFlow => Self::compose_data_flow(schema_version, operation),
            QueryFamily::EssentialInfo => Self::compose_essential_info(schema_version, operation),
        };

        let track_column = if uses_relational_join(schema_version) { "T.id" } else { "track_id" };
        Self::apply_bounds(&mut spec, bounds, track_column);
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_four_and_above_uses_track_join() {
        let factory = SqliteQueryFactory::new();
        let spec = factory
            .compose(4, EventOperation::Dispatch, QueryFamily::TrackEnumeration, &QueryBounds::default())
            .unwrap();
        assert!(spec.joins.iter().any(|j| j.contains("rocpd_track")));
    }

    #[test]
    fn version_below_four_reads_inline_columns() {
        let factory = SqliteQueryFactory::new();
        let spec = factory
            .compose(3, EventOperation::Dispatch, QueryFamily::TrackEnumeration, &QueryBounds::default())
            .unwrap();
        assert!(spec.joins.is_empty());
    }

    #[test]
    fn every_emission_path_binds_the_same_aliases() {
        let factory = SqliteQueryFactory::new();
        for version in [0, 4] {
            let spec = factory
                .compose(version, EventOperation::Region, QueryFamily::LevelSource, &QueryBounds::default())
                .unwrap();
            let aliases: Vec<&str> = spec.columns.iter().map(|c| c.alias.as_str()).collect();
            assert!(aliases.contains(&alias::START_TS));
            assert!(aliases.contains(&alias::END_TS));
        }
    }

    #[test]
    fn time_bounds_compose_into_a_filter_clause() {
        let factory = SqliteQueryFactory::new();
        let bounds = QueryBounds { track_ids: vec![1, 2], time_start: Some(10), time_end: Some(20) };
        let spec = factory.compose(4, EventOperation::Region, QueryFamily::Slice, &bounds).unwrap();
        let filter = spec.filter.unwrap();
        assert!(filter.contains("IN (1,2)"));
        assert!(filter.contains("startTs >= 10"));
        assert!(filter.contains("endTs <= 20"));
    }

    #[test]
    fn sample_regions_reject_data_flow_composition() {
        let factory = SqliteQueryFactory::new();
        let result = factory.compose(4, EventOperation::RegionSample, QueryFamily::DataFlow, &QueryBounds::default());
        assert!(result.is_err());
    }
}
