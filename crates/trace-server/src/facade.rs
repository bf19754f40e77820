//! The flat controller-ABI facade (`spec.md` §6): every entry point
//! operates on opaque [`HandleId`]s and returns a domain [`Result`],
//! which callers at an actual FFI boundary would flatten with
//! [`trace_domain::error::Error::to_status`]. Kept as ordinary Rust
//! functions over `&Controller` rather than raw pointers, since nothing
//! downstream in this workspace crosses a language boundary.

use std::sync::Arc;

use trace_application::level_assigner::assign_levels;
use trace_application::lod::{choose_lod_tier, collapse_events, LodEvent};
use trace_application::summary_engine::aggregate_sub_metrics;
use trace_application::table_engine::signature_from_arguments;
use trace_domain::entities::arguments::Arguments;
use trace_domain::entities::array::Array;
use trace_domain::entities::event::Event;
use trace_domain::entities::future::ControllerFuture;
use trace_domain::entities::handle::{Handle, HandleId, HandleKind};
use trace_domain::entities::summary::Summary;
use trace_domain::entities::track::Graph;
use trace_domain::error::{Error, Result};
use trace_domain::ports::query::{EventOperation, QueryBounds, QueryFamily};
use trace_domain::value_objects::data::Data;
use trace_domain::value_objects::property::Property;

use crate::arena::is_root_kind;
use crate::controller::Controller;
use crate::jobs::{CallStackFetchJob, ExportCsvJob, FlowFetchJob, LoadJob, QueryJob, TrimSaveJob};

/// `controller_future_alloc`.
pub fn controller_future_alloc(controller: &Controller) -> HandleId {
    controller.arena().insert(Box::new(ControllerFuture::new(HandleId::new(0))), true)
}

/// `future_wait`: block until `future` resolves or `timeout_ms` elapses.
pub fn future_wait(
    controller: &Controller,
    future: HandleId,
    timeout_ms: Option<u64>,
) -> Result<trace_domain::entities::future::FutureState> {
    let scheduled = controller.scheduled_job_for(future)?;
    let outcome = controller.job_scheduler.wait(scheduled, timeout_ms)?;
    apply_outcome(controller, future, outcome)
}

/// `future_cancel`: cancel the scheduled job, then propagate cancellation
/// to every dependent storage-layer future registered against it
/// (`spec.md` §4.2).
pub fn future_cancel(controller: &Controller, future: HandleId) -> Result<()> {
    let scheduled = controller.scheduled_job_for(future)?;
    controller.job_scheduler.cancel(scheduled)?;
    let dependents = controller.arena().with_mut(future, |handle| {
        let Some(f) = handle.as_any_mut().downcast_mut::<ControllerFuture>() else {
            return Vec::new();
        };
        f.cancel();
        f.dependents().to_vec()
    })?;
    for id in dependents {
        controller.runtime.block_on(controller.storage.future_cancel(trace_domain::ports::storage::StorageFutureId(id)))?;
    }
    Ok(())
}

fn apply_outcome(
    controller: &Controller,
    future: HandleId,
    outcome: trace_domain::ports::jobs::JobOutcome,
) -> Result<trace_domain::entities::future::FutureState> {
    use trace_domain::entities::future::FutureState;
    use trace_domain::ports::jobs::JobOutcome;

    controller.arena().with_mut(future, |handle| {
        let Some(f) = handle.as_any_mut().downcast_mut::<ControllerFuture>() else {
            return FutureState::Pending;
        };
        match outcome {
            JobOutcome::Success(data) => f.resolve_success(data),
            JobOutcome::Failed(status) => f.resolve_failure(status),
            JobOutcome::Cancelled => f.cancel(),
        }
        f.state()
    })
}

/// `controller_load_async`: open the storage file and populate the trace
/// root's schema version (`spec.md` §4.3).
pub fn controller_load_async(controller: &Arc<Controller>, future: HandleId) -> Result<()> {
    let path = controller.arena().with(controller.root(), |h| h.get_string(Property::ControllerTraceFilePath, 0))??;

    let job = Box::new(LoadJob {
        arena: controller.arena().clone(),
        runtime: controller.runtime.clone(),
        storage: Arc::clone(&controller.storage),
        path,
        trace_id: controller.root(),
        db_slot: Arc::clone(&controller.db),
        schema_version_slot: Arc::clone(&controller.schema_version),
        future,
    });
    controller.issue(future, job)
}

/// `controller_track_fetch_async`: fetch raw events in `[t_start, t_end]`
/// for `track` into a root [`Array`] of event ids (`spec.md` §4.5-4.6).
pub fn controller_track_fetch_async(
    controller: &Arc<Controller>,
    track: HandleId,
    t_start: u64,
    t_end: u64,
    future: HandleId,
) -> Result<()> {
    let db = controller.db_handle()?;
    let bounds = QueryBounds { track_ids: vec![track.raw()], time_start: Some(t_start), time_end: Some(t_end) };
    let spec = controller.query_factory.compose(controller.schema_version(), EventOperation::Region, QueryFamily::Slice, &bounds)?;
    let sql = controller.storage.build_table_query(db, &spec)?;

    let job = Box::new(QueryJob {
        arena: controller.arena().clone(),
        runtime: controller.runtime.clone(),
        storage: Arc::clone(&controller.storage),
        db,
        sql,
        description: "track fetch".to_string(),
        column_index: 2,
        future,
    });
    controller.issue(future, job)
}

/// `controller_graph_fetch_async`: select the region events backing
/// `graph`'s bound track over `[t_start, t_end]` (`spec.md` §4.6). LOD
/// reduction for `pixels` is applied by [`collapse_for_pixels`] once the
/// array resolves, since the storage layer returns raw rows.
pub fn controller_graph_fetch_async(
    controller: &Arc<Controller>,
    graph: HandleId,
    t_start: u64,
    t_end: u64,
    future: HandleId,
) -> Result<()> {
    let track_id = controller.arena().with(graph, |h| h.as_any().downcast_ref::<Graph>().map(Graph::track))?;
    let Some(track_id) = track_id else {
        return Err(Error::invalid_argument("handle is not a Graph"));
    };

    let db = controller.db_handle()?;
    let bounds = QueryBounds { track_ids: vec![track_id.raw()], time_start: Some(t_start), time_end: Some(t_end) };
    let spec = controller.query_factory.compose(controller.schema_version(), EventOperation::Region, QueryFamily::LevelSource, &bounds)?;
    let sql = controller.storage.build_table_query(db, &spec)?;

    let job = Box::new(QueryJob {
        arena: controller.arena().clone(),
        runtime: controller.runtime.clone(),
        storage: Arc::clone(&controller.storage),
        db,
        sql,
        description: "graph fetch".to_string(),
        column_index: 2,
        future,
    });
    controller.issue(future, job)
}

/// Collapse an already-fetched event slice to the LOD tier appropriate
/// for `pixels` (`spec.md` §4.6), for callers applying the reduction
/// in-process once a [`controller_graph_fetch_async`] array resolves.
#[must_use]
pub fn collapse_for_pixels(events: &[Event], pixels: u32) -> Vec<LodEvent> {
    let tier = choose_lod_tier(events.len() as u64, u64::from(pixels));
    collapse_events(events, tier)
}

/// Assign nesting levels to a freshly fetched event slice, mutating them
/// in place (`spec.md` §4.5).
pub fn assign_levels_in_place(events: &mut [Event]) {
    for assignment in assign_levels(events) {
        events[assignment.index].set_level(assignment.level);
    }
}

/// `controller_table_fetch_async`: unpack `args`, compose a `Table` query
/// family, and store the result page (`spec.md` §4.9).
pub fn controller_table_fetch_async(controller: &Arc<Controller>, _table: HandleId, args: HandleId, future: HandleId) -> Result<()> {
    let signature = controller.arena().with(args, |h| h.as_any().downcast_ref::<Arguments>().map(signature_from_arguments))?;
    let Some(signature) = signature else {
        return Err(Error::invalid_argument("handle is not Arguments"));
    };
    let _interned_filter = controller.strings.remap_filter(&signature.string_filter);

    let db = controller.db_handle()?;
    let bounds = QueryBounds { track_ids: signature.track_ids, time_start: signature.time_start, time_end: signature.time_end };
    let spec = controller.query_factory.compose(controller.schema_version(), EventOperation::Region, QueryFamily::Table, &bounds)?;
    let sql = controller.storage.build_table_query(db, &spec)?;

    let job = Box::new(QueryJob {
        arena: controller.arena().clone(),
        runtime: controller.runtime.clone(),
        storage: Arc::clone(&controller.storage),
        db,
        sql,
        description: "table fetch".to_string(),
        column_index: 0,
        future,
    });
    controller.issue(future, job)
}

/// `controller_table_export_csv`.
pub fn controller_table_export_csv(controller: &Arc<Controller>, _table: HandleId, args: HandleId, future: HandleId, path: String) -> Result<()> {
    let signature = controller.arena().with(args, |h| h.as_any().downcast_ref::<Arguments>().map(signature_from_arguments))?;
    let Some(signature) = signature else {
        return Err(Error::invalid_argument("handle is not Arguments"));
    };

    let db = controller.db_handle()?;
    let bounds = QueryBounds { track_ids: signature.track_ids, time_start: signature.time_start, time_end: signature.time_end };
    let spec = controller.query_factory.compose(controller.schema_version(), EventOperation::Region, QueryFamily::Table, &bounds)?;
    let sql = controller.storage.build_table_query(db, &spec)?;

    let job = Box::new(ExportCsvJob {
        arena: controller.arena().clone(),
        runtime: controller.runtime.clone(),
        storage: Arc::clone(&controller.storage),
        db,
        sql,
        out_path: path,
        future,
    });
    controller.issue(future, job)
}

/// `controller_summary_fetch_async`: merge a summary node's children's
/// metrics and publish the result as a root `SummaryMetrics` handle
/// (`spec.md` §4.10).
pub fn controller_summary_fetch_async(controller: &Controller, summary: HandleId, future: HandleId) -> Result<()> {
    let children = controller.arena().with(summary, |h| h.as_any().downcast_ref::<Summary>().map(|s| s.children().to_vec()))?;
    let Some(children) = children else {
        return Err(Error::invalid_argument("handle is not a Summary"));
    };

    let mut child_metrics = Vec::with_capacity(children.len());
    for child in children {
        let metrics = controller.arena().with(child, |h| h.as_any().downcast_ref::<Summary>().map(|s| s.metrics().clone()))?;
        if let Some(metrics) = metrics {
            child_metrics.push(metrics);
        }
    }

    let merged = aggregate_sub_metrics(&child_metrics);
    let result_id = controller.arena().insert(Box::new(merged), true);
    controller.arena().with_mut(future, |handle| {
        if let Some(f) = handle.as_any_mut().downcast_mut::<ControllerFuture>() {
            f.resolve_success(Data::Object(Some(result_id)));
        }
    })
}

/// `controller_get_indexed_property_async`: read `count` consecutive
/// indices of `property` off `object` into a root [`Array`] (`spec.md` §6).
/// Tries each primitive accessor in turn, since the property itself (not
/// the call site) determines which one applies.
pub fn controller_get_indexed_property_async(
    controller: &Controller,
    object: HandleId,
    property: Property,
    index: u64,
    count: u64,
    future: HandleId,
) -> Result<()> {
    let mut entries = Vec::with_capacity(count as usize);
    for offset in 0..count {
        let i = index + offset;
        let value = controller.arena().with(object, |h| -> Result<Data> {
            if let Ok(v) = h.get_u64(property, i) {
                return Ok(Data::UInt64(v));
            }
            if let Ok(v) = h.get_f64(property, i) {
                return Ok(Data::Double(v));
            }
            if let Ok(v) = h.get_string(property, i) {
                return Ok(Data::String(v));
            }
            h.get_object(property, i).map(Data::Object)
        })??;
        entries.push(value);
    }

    let array_id = controller.arena().insert(Box::new(Array::new(entries)), true);
    controller.arena().with_mut(future, |handle| {
        if let Some(f) = handle.as_any_mut().downcast_mut::<ControllerFuture>() {
            f.resolve_success(Data::Object(Some(array_id)));
        }
    })
}

/// `controller_save_trimmed_trace`.
pub fn controller_save_trimmed_trace(controller: &Arc<Controller>, t_start: u64, t_end: u64, path: String, future: HandleId) -> Result<()> {
    let db = controller.db_handle()?;
    let job = Box::new(TrimSaveJob {
        arena: controller.arena().clone(),
        runtime: controller.runtime.clone(),
        storage: Arc::clone(&controller.storage),
        db,
        start: t_start,
        end: t_end,
        out_path: path,
        future,
    });
    controller.issue(future, job)
}

/// `controller_event_flow_fetch_async`: resolve `future` to a root
/// [`Array`] of `FlowControl` sub-handles, one per other event sharing
/// `event_id`'s correlation group (`spec.md` §4 "Flow/Stack/ExtData fetch").
pub fn controller_event_flow_fetch_async(controller: &Arc<Controller>, event_id: u64, future: HandleId) -> Result<()> {
    let db = controller.db_handle()?;
    let spec = controller.query_factory.compose(controller.schema_version(), EventOperation::Region, QueryFamily::DataFlow, &QueryBounds::default())?;
    let sql = controller.storage.build_table_query(db, &spec)?;

    let job = Box::new(FlowFetchJob {
        arena: controller.arena().clone(),
        runtime: controller.runtime.clone(),
        storage: Arc::clone(&controller.storage),
        db,
        sql,
        event_id,
        future,
    });
    controller.issue(future, job)
}

/// `controller_event_call_stack_fetch_async`: resolve `future` to a
/// single `CallStack` sub-handle built from `event_id`'s correlation
/// group, ordered by event id (`spec.md` §4 "Flow/Stack/ExtData fetch").
pub fn controller_event_call_stack_fetch_async(controller: &Arc<Controller>, event_id: u64, future: HandleId) -> Result<()> {
    let db = controller.db_handle()?;
    let spec = controller.query_factory.compose(controller.schema_version(), EventOperation::Region, QueryFamily::DataFlow, &QueryBounds::default())?;
    let sql = controller.storage.build_table_query(db, &spec)?;

    let job = Box::new(CallStackFetchJob {
        arena: controller.arena().clone(),
        runtime: controller.runtime.clone(),
        storage: Arc::clone(&controller.storage),
        db,
        sql,
        event_id,
        future,
    });
    controller.issue(future, job)
}

/// `get_u64`/`get_f64`/`get_string`/`get_object` and their setters.
pub fn get_u64(controller: &Controller, handle: HandleId, property: Property, index: u64) -> Result<u64> {
    controller.arena().with(handle, |h| h.get_u64(property, index))?
}

pub fn get_f64(controller: &Controller, handle: HandleId, property: Property, index: u64) -> Result<f64> {
    controller.arena().with(handle, |h| h.get_f64(property, index))?
}

pub fn get_string(controller: &Controller, handle: HandleId, property: Property, index: u64) -> Result<String> {
    controller.arena().with(handle, |h| h.get_string(property, index))?
}

pub fn get_object(controller: &Controller, handle: HandleId, property: Property, index: u64) -> Result<Option<HandleId>> {
    controller.arena().with(handle, |h| h.get_object(property, index))?
}

pub fn set_u64(controller: &Controller, handle: HandleId, property: Property, index: u64, value: u64) -> Result<()> {
    controller.arena().with_mut(handle, |h| h.set_u64(property, index, value))?
}

pub fn set_f64(controller: &Controller, handle: HandleId, property: Property, index: u64, value: f64) -> Result<()> {
    controller.arena().with_mut(handle, |h| h.set_f64(property, index, value))?
}

pub fn set_string(controller: &Controller, handle: HandleId, property: Property, index: u64, value: String) -> Result<()> {
    controller.arena().with_mut(handle, |h| h.set_string(property, index, value))?
}

pub fn set_object(controller: &Controller, handle: HandleId, property: Property, index: u64, value: Option<HandleId>) -> Result<()> {
    controller.arena().with_mut(handle, |h| h.set_object(property, index, value))?
}

/// `free`: only root-owned handles may be released this way (`spec.md` §6).
pub fn free(controller: &Controller, handle: HandleId) -> Result<()> {
    controller.arena().free(handle)
}

#[must_use]
pub fn is_freeable(kind: HandleKind) -> bool {
    is_root_kind(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_domain::entities::trace::Trace;

    #[test]
    fn get_indexed_property_dispatches_the_matching_accessor() {
        let arena = crate::arena::HandleArena::new();
        let root = arena.insert(Box::new(Trace::new(HandleKind::ControllerSystem, "trace.db".to_string())), true);
        let path = arena.with(root, |h| h.get_string(Property::ControllerTraceFilePath, 0)).unwrap().unwrap();
        assert_eq!(path, "trace.db");
    }
}
