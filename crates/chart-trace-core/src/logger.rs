//! Process-wide log setup for chart-trace drivers.
//!
//! Library code only talks to the `log` facade (and `tracing` spans when the
//! feature is on). Binaries pick one sink:
//!
//! - [`init_with_level`]: plain stderr lines tagged with the worker thread,
//!   so interleaved batch output can be told apart,
//! - [`init_tracing`]: a `tracing` subscriber reporting stage spans, as text
//!   or JSON lines.

use std::fmt::Arguments;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable selecting the [`LogFormat`] of [`LogFormat::from_env`].
pub const LOG_FORMAT_ENV: &str = "CHART_TRACE_LOG_FORMAT";

/// Output format of the tracing subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One flattened JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse `text` or `json` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Read [`LOG_FORMAT_ENV`]; unset or unknown values give `Text`.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

struct WorkerLogger {
    level: LevelFilter,
    started: Instant,
}

fn write_line(
    out: &mut impl Write,
    elapsed: f64,
    level: Level,
    worker: &str,
    target: &str,
    args: &Arguments<'_>,
) -> std::io::Result<()> {
    writeln!(out, "[{elapsed:8.3}s {level:>5} {worker}] {target}: {args}")
}

impl Log for WorkerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let thread = std::thread::current();
        let worker = thread.name().unwrap_or("-");
        let _ = write_line(
            &mut std::io::stderr().lock(),
            self.started.elapsed().as_secs_f64(),
            record.level(),
            worker,
            record.target(),
            record.args(),
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<WorkerLogger> = OnceLock::new();

/// Install the stderr logger at `level`.
///
/// Only the first call installs anything; later calls return `Ok` and keep
/// the original level. Fails if another `log` backend is already set.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| WorkerLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}

/// Install a `tracing` subscriber that reports pipeline spans on close.
///
/// The filter comes from `RUST_LOG` and falls back to `info`. `log` records
/// are forwarded as events. A second call leaves the first subscriber in
/// place.
#[cfg(feature = "tracing")]
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_thread_names(true);
    let _ = match format {
        LogFormat::Json => builder.json().flatten_event(true).finish().try_init(),
        LogFormat::Text => builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_keeps_first_level() {
        init_with_level(LevelFilter::Debug).unwrap();
        init_with_level(LevelFilter::Warn).unwrap();
        assert_eq!(log::max_level(), LevelFilter::Debug);
        log::debug!("logger installed once");
    }

    #[test]
    fn line_carries_worker_and_target() {
        let mut buf = Vec::new();
        write_line(
            &mut buf,
            1.5,
            Level::Warn,
            "chart-trace-2",
            "chart_trace::quality",
            &format_args!("{} jumps", 3),
        )
        .unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert_eq!(line, "[   1.500s  WARN chart-trace-2] chart_trace::quality: 3 jumps\n");
    }

    #[test]
    fn log_format_parses_known_names() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" text "), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("xml"), None);
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}
