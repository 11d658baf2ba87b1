use crate::domains::logger::{DomainLogger, FileLogger};
use std::sync::Arc;

/// Parses a level name from configuration; unknown names fall back to `Info`.
pub fn parse_level(level: &str) -> log::LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// Initialize the file logger and return a domain logger instance the application can inject.
/// `fast_log` installs a global logger, so this succeeds at most once per process.
pub fn init_file_logger(path: &str, level: &str) -> Result<Arc<dyn DomainLogger>, String> {
    FileLogger::init(path, parse_level(level)).map_err(|e| format!("Failed to initialize fast_log: {}", e))?;
    Ok(Arc::new(FileLogger))
}
