use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Discards every message. Selected when `logging.level = "off"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl DomainLogger for NoopLogger {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

pub fn init_noop_logger() -> DynLogger {
    Arc::new(NoopLogger)
}
