//! Process-wide logging setup.
//!
//! Library code only uses the `log` macros. Binaries pick a backend once at
//! startup: [`init_with_level`] installs a small stderr logger, and with the
//! `tracing` feature [`init_tracing`] installs a `tracing-subscriber` that
//! also receives `log` records.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

/// Writes `[seconds LEVEL crate] message` lines to stderr.
struct StderrLogger {
    max_level: LevelFilter,
    epoch: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let crate_name = record.target().split("::").next().unwrap_or_default();
        let secs = self.epoch.elapsed().as_secs_f64();
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{secs:8.3}s {:>5} {crate_name}] {}",
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static STDERR_LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Only the first call has an effect.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if STDERR_LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = STDERR_LOGGER.get_or_init(|| StderrLogger {
        max_level: level,
        epoch: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Route `log` records into `tracing` and install a fmt subscriber on
/// stderr. `RUST_LOG` overrides `level`; `json` switches to one JSON object
/// per line.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::{fmt, EnvFilter};

    if tracing_log::LogTracer::init_with_filter(level).is_err() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_ascii_lowercase()));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())
    } else {
        tracing::subscriber::set_global_default(
            builder.with_timer(fmt::time::Uptime::default()).finish(),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        assert!(init_with_level(LevelFilter::Warn).is_ok());
        assert!(init_with_level(LevelFilter::Trace).is_ok());
        assert_eq!(log::max_level(), LevelFilter::Warn);
    }
}
