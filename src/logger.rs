use std::sync::Arc;
use std::time::Duration;

use spdlog::sink::{RotatingFileSink, RotationPolicy, Sink, StdStream, StdStreamSink};
use spdlog::{Level, LevelFilter, Logger};

use crate::config::{Config, Log, LogLevel};

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

fn build_sinks(log: &Log) -> spdlog::Result<Vec<Arc<dyn Sink>>> {
    let mut sinks: Vec<Arc<dyn Sink>> = vec![];

    let file_sink = RotatingFileSink::builder()
        .base_path(&log.location)
        .rotation_policy(RotationPolicy::Daily { hour: 0, minute: 0 })
        .max_files(60)
        .build()?;
    sinks.push(Arc::new(file_sink));

    if log.log_to_console {
        let stdout = StdStreamSink::builder()
            .std_stream(StdStream::Stdout)
            .level_filter(LevelFilter::MoreVerbose(Level::Warn))
            .build()?;
        sinks.push(Arc::new(stdout));

        let stderr = StdStreamSink::builder()
            .std_stream(StdStream::Stderr)
            .level_filter(LevelFilter::MoreSevereEqual(Level::Warn))
            .build()?;
        sinks.push(Arc::new(stderr));
    }

    Ok(sinks)
}

/// Installs the default logger from the optional `[log]` config section:
/// a daily-rotated file sink, plus console sinks when enabled. Without a
/// `[log]` section the stock console logger stays in place.
pub fn configure_logger(config: &Config) -> spdlog::Result<()> {
    let Some(ref log) = config.log else {
        return Ok(());
    };

    let mut builder = Logger::builder();
    for sink in build_sinks(log)? {
        builder.sink(sink);
    }

    let logger = Arc::new(builder.build()?);
    logger.set_level_filter(LevelFilter::MoreSevereEqual(log.level.into()));
    logger.set_flush_level_filter(LevelFilter::MoreSevereEqual(Level::Warn));
    logger.set_flush_period(Some(Duration::from_secs(5)));
    spdlog::set_default_logger(logger);

    Ok(())
}
