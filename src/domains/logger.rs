use chrono::Utc;
use log::{debug as log_debug, error as log_error, info as log_info, warn as log_warn};
use std::sync::Arc;

/// Logging port used by the tracking and narration domains.
/// Calls never fail from the domain's point of view.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
    /// Per-entity chatter (dot products, distances). Dropped by default.
    fn debug(&self, _msg: &str) {}
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// File adapter using `fast_log` for writing and the `log` facade for records.
pub struct FileLogger;

impl FileLogger {
    /// Initialize fast_log with console echo and a file appender at `path`.
    pub fn init(path: &str, level: log::LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
        fast_log::init(
            fast_log::config::Config::new()
                .console()
                .file(path)
                .level(level),
        )?;
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

    fn debug(&self, msg: &str) {
        log_debug!("{} - {}", Utc::now().to_rfc3339(), msg);
    }
}
