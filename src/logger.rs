use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use spdlog::sink::{RotatingFileSink, RotationPolicy, Sink, StdStream, StdStreamSink};
use spdlog::{Level, LevelFilter, Logger};

use crate::config::{Config, Log, LogLevel};

/// One file per day, two months kept.
const KEPT_LOG_FILES: usize = 60;
const FLUSH_EVERY: Duration = Duration::from_secs(2);

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Critical => Level::Critical,
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        }
    }
}

/// `<user cache dir>/autopost/log/autopost.log`, or under the temp dir
/// when the platform has no cache dir.
pub fn default_log_location() -> PathBuf {
    let mut location = dirs::cache_dir().unwrap_or_else(env::temp_dir);
    location.extend(["autopost", "log", "autopost.log"]);
    location
}

fn file_sink(location: &Path) -> spdlog::Result<Arc<dyn Sink>> {
    let sink = RotatingFileSink::builder()
        .base_path(location)
        .rotation_policy(RotationPolicy::Daily { hour: 0, minute: 0 })
        .max_files(KEPT_LOG_FILES)
        .rotate_on_open(false)
        .build()?;
    Ok(Arc::new(sink))
}

/// Warnings and errors go to stderr, everything below to stdout.
fn console_sinks() -> spdlog::Result<Vec<Arc<dyn Sink>>> {
    let below_warn = StdStreamSink::builder()
        .std_stream(StdStream::Stdout)
        .level_filter(LevelFilter::MoreVerbose(Level::Warn))
        .build()?;
    let warn_and_up = StdStreamSink::builder()
        .std_stream(StdStream::Stderr)
        .level_filter(LevelFilter::MoreSevereEqual(Level::Warn))
        .build()?;
    let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(below_warn), Arc::new(warn_and_up)];
    Ok(sinks)
}

fn build_logger(log: &Log) -> spdlog::Result<Arc<Logger>> {
    let location = log.location.clone().unwrap_or_else(default_log_location);

    let mut sinks = vec![file_sink(&location)?];
    if log.log_to_console {
        sinks.extend(console_sinks()?);
    }

    let logger = Arc::new(Logger::builder()
        .sinks(sinks)
        .level_filter(LevelFilter::MoreSevereEqual(log.level.into()))
        .flush_level_filter(LevelFilter::MoreSevereEqual(Level::Info))
        .build()?);
    logger.set_flush_period(Some(FLUSH_EVERY));
    Ok(logger)
}

/// Without a `[log]` section the default console logger stays in place.
pub fn configure_logger(config: &Config) -> spdlog::Result<()> {
    let Some(log) = &config.log else {
        return Ok(());
    };
    spdlog::set_default_logger(build_logger(log)?);
    Ok(())
}
