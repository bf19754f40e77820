//! # CLI Driver
//!
//! Wires the `trace-infrastructure` DI bundle and `trace-providers`'
//! SQLite backend into a `trace-server::Controller`, then dispatches
//! `clap` subcommands onto the facade functions (`spec.md` §6, §10).

use std::sync::Arc;

use clap::{Parser, Subcommand};
use trace_domain::entities::handle::HandleKind;
use trace_domain::error::Result;
use trace_domain::ports::query::QueryFactory;
use trace_domain::ports::storage::StorageInterface;
use trace_infrastructure::ServicesBuilder;
use trace_providers::{SqliteQueryFactory, SqliteStorage};
use trace_server::facade;
use trace_server::Controller;

/// `tracevis`: a command-line driver over the controller facade.
#[derive(Debug, Parser)]
#[command(name = "tracevis", version, about = "Profiling-trace analytics engine CLI")]
pub struct Cli {
    /// Path to a TOML config overlay (`TRACEVIS_*` env vars take
    /// precedence over the file, which takes precedence over defaults).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open a trace file and report its detected schema version.
    Load {
        /// Path to the `.db`/`.sqlite` trace file.
        path: String,
    },
    /// Fetch raw events for one track over a time range.
    TrackFetch {
        path: String,
        track_id: u64,
        #[arg(long, default_value_t = 0)]
        start: u64,
        #[arg(long)]
        end: u64,
    },
    /// Export the region-event table to a CSV file.
    ExportCsv {
        path: String,
        /// Destination CSV path.
        out: String,
    },
    /// Write a new trace file containing only `[start, end]`.
    TrimSave {
        path: String,
        start: u64,
        end: u64,
        out: String,
    },
}

/// Build the long-lived services and run `command` to completion,
/// blocking the calling thread on every issued job (`spec.md` §4.2).
pub fn run(cli: &Cli) -> Result<()> {
    let config = trace_infrastructure::config::load(cli.config.as_deref())?;
    let services = ServicesBuilder::new(config).build();

    let runtime = tokio::runtime::Runtime::new().map_err(trace_domain::error::Error::from)?;
    let storage: Arc<dyn StorageInterface> = Arc::new(SqliteStorage::new());
    let query_factory: Arc<dyn QueryFactory> = Arc::new(SqliteQueryFactory::new());

    match &cli.command {
        Command::Load { path } => run_load(&runtime, &services, Arc::clone(&storage), Arc::clone(&query_factory), path),
        Command::TrackFetch { path, track_id, start, end } => {
            run_track_fetch(&runtime, &services, Arc::clone(&storage), Arc::clone(&query_factory), path, *track_id, *start, *end)
        }
        Command::ExportCsv { path, out } => run_export_csv(&runtime, &services, Arc::clone(&storage), Arc::clone(&query_factory), path, out),
        Command::TrimSave { path, start, end, out } => {
            run_trim_save(&runtime, &services, Arc::clone(&storage), Arc::clone(&query_factory), path, *start, *end, out)
        }
    }
}

fn new_controller(
    runtime: &tokio::runtime::Runtime,
    services: &trace_infrastructure::Services,
    storage: Arc<dyn StorageInterface>,
    query_factory: Arc<dyn QueryFactory>,
    path: &str,
) -> Arc<Controller> {
    Controller::alloc(
        path.to_string(),
        HandleKind::ControllerSystem,
        runtime.handle().clone(),
        storage,
        query_factory,
        Arc::clone(&services.job_scheduler),
        Arc::clone(&services.lru),
    )
}

fn wait_for(controller: &Controller, future: trace_domain::entities::handle::HandleId) -> Result<()> {
    match facade::future_wait(controller, future, None)? {
        trace_domain::entities::future::FutureState::Success => Ok(()),
        trace_domain::entities::future::FutureState::Cancelled => Err(trace_domain::error::Error::Cancelled),
        trace_domain::entities::future::FutureState::Failed(status) => {
            Err(trace_domain::error::Error::invalid_argument(format!("job failed: {status:?}")))
        }
        trace_domain::entities::future::FutureState::Pending => {
            Err(trace_domain::error::Error::invalid_argument("future still pending after wait"))
        }
    }
}

fn run_load(
    runtime: &tokio::runtime::Runtime,
    services: &trace_infrastructure::Services,
    storage: Arc<dyn StorageInterface>,
    query_factory: Arc<dyn QueryFactory>,
    path: &str,
) -> Result<()> {
    let controller = new_controller(runtime, services, storage, query_factory, path);
    let future = facade::controller_future_alloc(&controller);
    facade::controller_load_async(&controller, future)?;
    wait_for(&controller, future)?;
    tracing::info!(schema_version = controller.schema_version(), "trace loaded");
    Ok(())
}

fn run_track_fetch(
    runtime: &tokio::runtime::Runtime,
    services: &trace_infrastructure::Services,
    storage: Arc<dyn StorageInterface>,
    query_factory: Arc<dyn QueryFactory>,
    path: &str,
    track_id: u64,
    start: u64,
    end: u64,
) -> Result<()> {
    let controller = new_controller(runtime, services, storage, query_factory, path);
    let load_future = facade::controller_future_alloc(&controller);
    facade::controller_load_async(&controller, load_future)?;
    wait_for(&controller, load_future)?;

    let fetch_future = facade::controller_future_alloc(&controller);
    facade::controller_track_fetch_async(&controller, trace_domain::entities::handle::HandleId::new(track_id), start, end, fetch_future)?;
    wait_for(&controller, fetch_future)?;
    let array = facade::get_object(&controller, fetch_future, trace_domain::value_objects::property::Property::FutureObject, 0)?;
    let count = match array {
        Some(id) => facade::get_u64(&controller, id, trace_domain::value_objects::property::Property::ArrayCount, 0)?,
        None => 0,
    };
    tracing::info!(count, "track fetch complete");
    Ok(())
}

fn run_export_csv(
    runtime: &tokio::runtime::Runtime,
    services: &trace_infrastructure::Services,
    storage: Arc<dyn StorageInterface>,
    query_factory: Arc<dyn QueryFactory>,
    path: &str,
    out: &str,
) -> Result<()> {
    let controller = new_controller(runtime, services, storage, query_factory, path);
    let load_future = facade::controller_future_alloc(&controller);
    facade::controller_load_async(&controller, load_future)?;
    wait_for(&controller, load_future)?;

    let args_id = controller.arena().insert(Box::new(trace_domain::entities::arguments::Arguments::new()), true);
    let export_future = facade::controller_future_alloc(&controller);
    facade::controller_table_export_csv(&controller, controller.root(), args_id, export_future, out.to_string())?;
    wait_for(&controller, export_future)?;
    tracing::info!(out, "export complete");
    Ok(())
}

fn run_trim_save(
    runtime: &tokio::runtime::Runtime,
    services: &trace_infrastructure::Services,
    storage: Arc<dyn StorageInterface>,
    query_factory: Arc<dyn QueryFactory>,
    path: &str,
    start: u64,
    end: u64,
    out: &str,
) -> Result<()> {
    let controller = new_controller(runtime, services, storage, query_factory, path);
    let load_future = facade::controller_future_alloc(&controller);
    facade::controller_load_async(&controller, load_future)?;
    wait_for(&controller, load_future)?;

    let trim_future = facade::controller_future_alloc(&controller);
    facade::controller_save_trimmed_trace(&controller, start, end, out.to_string(), trim_future)?;
    wait_for(&controller, trim_future)?;
    tracing::info!(out, "trim-save complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_subcommand_parses() {
        let cli = Cli::try_parse_from(["tracevis", "load", "trace.db"]).unwrap();
        assert!(matches!(cli.command, Command::Load { path } if path == "trace.db"));
    }

    #[test]
    fn track_fetch_requires_an_end_bound() {
        let result = Cli::try_parse_from(["tracevis", "track-fetch", "trace.db", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_flag_is_global_to_every_subcommand() {
        let cli = Cli::try_parse_from(["tracevis", "--config", "engine.toml", "export-csv", "trace.db", "out.csv"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("engine.toml"));
    }
}
