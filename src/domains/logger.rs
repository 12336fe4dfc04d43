use chrono::Utc;
use log::{error as log_error, info as log_info, warn as log_warn, LevelFilter};
use std::str::FromStr;
use std::sync::Arc;

/// Experiment-level diagnostics port. Stages report placement failures,
/// configuration problems and run boundaries through it; per-tick chatter
/// goes to `tracing` instead.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);

    /// Pushes buffered output to its sink. Most adapters write through.
    fn flush(&self) {}
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// Writes through `log` into a `fast_log` file appender.
pub struct FileLogger;

impl FileLogger {
    /// `level` is a `log` level name; unknown names fall back to info.
    pub fn init(path: &str, level: &str) -> Result<(), Box<dyn std::error::Error>> {
        let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);
        fast_log::init(fast_log::config::Config::new().file(path).level(level))?;
        Ok(())
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        log_info!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log_warn!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log_error!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn flush(&self) {
        log::logger().flush();
    }
}
