use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Forwards every message to each of its sinks in order.
pub struct MultiLogger {
    sinks: Vec<Arc<dyn DomainLogger>>,
}

impl MultiLogger {
    pub fn new(sinks: Vec<Arc<dyn DomainLogger>>) -> Self {
        Self { sinks }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.error(msg));
    }

    fn flush(&self) {
        self.sinks.iter().for_each(|s| s.flush());
    }
}

/// Console logger, plus the file logger when `path` is set and fast_log
/// accepts it.
pub fn init_experiment_logger(path: Option<&str>, level: &str) -> Arc<dyn DomainLogger> {
    let console = super::init_console_logger();
    let Some(path) = path else {
        return console;
    };
    match super::init_file_logger(path, level) {
        Ok(file) => Arc::new(MultiLogger::new(vec![file, console])),
        Err(e) => {
            console.warn(&format!("file logging disabled: {}", e));
            console
        }
    }
}
