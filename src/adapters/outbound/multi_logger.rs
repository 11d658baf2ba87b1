use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// A simple multi-forwarding logger that forwards to two DomainLogger instances.
/// This allows optional file + tracing outputs without changing the DomainLogger trait.
pub struct MultiLogger {
    primary: Arc<dyn DomainLogger>,
    secondary: Option<Arc<dyn DomainLogger>>,
}

impl MultiLogger {
    pub fn new(primary: Arc<dyn DomainLogger>, secondary: Option<Arc<dyn DomainLogger>>) -> Self {
        Self { primary, secondary }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.primary.info(msg);
        if let Some(sec) = &self.secondary {
            sec.info(msg);
        }
    }

    fn warn(&self, msg: &str) {
        self.primary.warn(msg);
        if let Some(sec) = &self.secondary {
            sec.warn(msg);
        }
    }

    fn error(&self, msg: &str) {
        self.primary.error(msg);
        if let Some(sec) = &self.secondary {
            sec.error(msg);
        }
    }

    fn debug(&self, msg: &str) {
        self.primary.debug(msg);
        if let Some(sec) = &self.secondary {
            sec.debug(msg);
        }
    }
}

/// Try to attach a file logger next to the tracing logger. Falls back to
/// tracing alone when the file cannot be opened.
pub fn init_combined_logger(path: &str, level: &str) -> Arc<dyn DomainLogger> {
    let tracing_logger = crate::adapters::outbound::init_tracing_logger("storygen");
    match crate::adapters::outbound::file_logger::init_file_logger(path, level) {
        Ok(file_logger) => Arc::new(MultiLogger::new(tracing_logger, Some(file_logger))) as Arc<dyn DomainLogger>,
        Err(e) => {
            tracing_logger.warn(&format!("File logging disabled: {}", e));
            tracing_logger
        }
    }
}
