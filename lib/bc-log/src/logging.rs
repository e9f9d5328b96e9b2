//! `tracing`/`tracing-subscriber` setup, grounded on the teacher's
//! `environment::logging` (format/output-location types, the
//! `OutputFormatter` enum dodging the "layers have different types"
//! problem, `EnvFilter` defaulting, a `WorkerGuard`-holding return value),
//! trimmed to what a single-process solver needs: no JSON sidecar file, no
//! `texray` span profiler.

use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
    str::FromStr,
};

use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Format, time::FormatTime, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
    util::TryInitError,
    EnvFilter,
};

#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Full,
    Pretty,
    Json,
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Full
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLocation {
    StdOut,
    StdErr,
    File(PathBuf),
}

impl Default for OutputLocation {
    fn default() -> Self {
        OutputLocation::StdErr
    }
}

impl Display for OutputLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputLocation::StdOut => f.write_str("stdout"),
            OutputLocation::StdErr => f.write_str("stderr"),
            OutputLocation::File(path) => Display::fmt(&path.to_string_lossy(), f),
        }
    }
}

impl FromStr for OutputLocation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(Self::StdOut),
            "stderr" => Ok(Self::StdErr),
            other => Ok(Self::File(PathBuf::from(other))),
        }
    }
}

#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

enum OutputFormatter<T> {
    Full(Format<fmt::format::Full, T>),
    Pretty(Format<fmt::format::Pretty, T>),
    Json(Format<fmt::format::Json, T>),
    Compact(Format<fmt::format::Compact, T>),
}

impl<S, N, T> FormatEvent<S, N> for OutputFormatter<T>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    T: FormatTime,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        writer: fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        match self {
            OutputFormatter::Full(f) => f.format_event(ctx, writer, event),
            OutputFormatter::Pretty(f) => f.format_event(ctx, writer, event),
            OutputFormatter::Json(f) => f.format_event(ctx, writer, event),
            OutputFormatter::Compact(f) => f.format_event(ctx, writer, event),
        }
    }
}

/// Guard that must be held for the lifetime of the process when logging to
/// a file; dropping it flushes the non-blocking writer.
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

/// Installs a global `tracing` subscriber. `log_level` overrides `RUST_LOG`
/// when set, otherwise falls back to `RUST_LOG` or a debug-vs-release
/// default, mirroring the teacher's `init_logger`.
pub fn init_logger(
    format: LogFormat,
    output: &OutputLocation,
    log_level: Option<LogLevel>,
) -> Result<LogGuard, TryInitError> {
    let filter = match log_level {
        Some(level) => EnvFilter::default().add_directive(tracing::Level::from(level).into()),
        None => match std::env::var("RUST_LOG") {
            Ok(env) => EnvFilter::new(env),
            Err(_) if cfg!(debug_assertions) => {
                EnvFilter::default().add_directive(tracing::Level::DEBUG.into())
            }
            Err(_) => EnvFilter::default().add_directive(tracing::Level::WARN.into()),
        },
    };

    let base = fmt::format().with_timer(fmt::time::Uptime::default()).with_target(true);
    let output_format = match format {
        LogFormat::Full => OutputFormatter::Full(base.clone()),
        LogFormat::Pretty => OutputFormatter::Pretty(base.clone().pretty()),
        LogFormat::Json => OutputFormatter::Json(base.clone().json()),
        LogFormat::Compact => OutputFormatter::Compact(base.clone().compact()),
    };

    let (writer, guard) = match output {
        OutputLocation::StdOut => (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout),
            None,
        ),
        OutputLocation::StdErr => (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr),
            None,
        ),
        OutputLocation::File(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("bc.log"));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (
                tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking),
                Some(guard),
            )
        }
    };

    let layer = fmt::layer().event_format(output_format).with_writer(writer);

    tracing_subscriber::registry().with(filter).with(layer).try_init()?;

    Ok(LogGuard(guard))
}
