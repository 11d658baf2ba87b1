use super::payload::NarrationRequest;
use super::summary::SummaryRequest;
use crate::common::DomainResult;
use async_trait::async_trait;

/// Text-completion service the narration is sent to.
#[async_trait]
pub trait NarrationDispatcher: Send + Sync {
    async fn complete(&self, request: &NarrationRequest) -> DomainResult<String>;

    /// One-off whole-world overview, answered in its own slot.
    async fn summarize(&self, request: &SummaryRequest) -> DomainResult<String>;
}

/// Shared text location holding the latest answer. The HUD polls it.
pub trait ResponseSlot: Send + Sync {
    fn read(&self) -> DomainResult<String>;
    fn write(&self, text: &str) -> DomainResult<()>;

    fn clear(&self) -> DomainResult<()> {
        self.write("")
    }
}
