use crate::domains::logger::{DomainLogger, FileLogger};
use std::sync::Arc;

/// Initialize the fast_log file appender and return a logger the pipeline
/// can be injected with.
pub fn init_file_logger(path: &str, level: &str) -> Result<Arc<dyn DomainLogger>, String> {
    FileLogger::init(path, level).map_err(|e| format!("Failed to initialize fast_log: {}", e))?;
    Ok(Arc::new(FileLogger))
}
