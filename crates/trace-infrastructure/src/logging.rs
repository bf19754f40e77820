//! Logging initialization: `tracing` + `tracing-subscriber`, with an
//! optional rolling file appender. Single entry point, called once from
//! `trace-cli`'s `main`.

use tracing_subscriber::EnvFilter;

/// Where log output goes in addition to stderr.
#[derive(Debug, Clone)]
pub enum LogSink {
    /// Only stderr.
    StderrOnly,
    /// Stderr plus a daily-rolling file under `directory` named `prefix.*`.
    RollingFile { directory: String, prefix: String },
}

/// Initialize the global tracing subscriber. Idempotent: a second call
/// is a silent no-op rather than a panic, so tests can call it freely.
///
/// Honors `RUST_LOG` via [`EnvFilter`]; defaults to `info` when unset.
pub fn init(sink: LogSink, json: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = match sink {
        LogSink::StderrOnly => (tracing_appender::non_blocking(std::io::stderr()).0, None),
        LogSink::RollingFile { directory, prefix } => {
            let appender = tracing_appender::rolling::daily(directory, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (writer, Some(guard))
        }
    };

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(writer);

    let result = if json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized, skipping");
    }

    guard
}
