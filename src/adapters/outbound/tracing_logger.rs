use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Forwards domain log calls to `tracing`, tagging each record with the
/// component that owns the logger.
pub struct TracingLogger {
    component: String,
}

impl TracingLogger {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
        }
    }
}

impl DomainLogger for TracingLogger {
    fn info(&self, msg: &str) {
        tracing::info!(component = %self.component, "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(component = %self.component, "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(component = %self.component, "{}", msg);
    }

    fn debug(&self, msg: &str) {
        tracing::debug!(component = %self.component, "{}", msg);
    }
}

pub fn init_tracing_logger(component: &str) -> Arc<dyn DomainLogger> {
    Arc::new(TracingLogger::new(component))
}
