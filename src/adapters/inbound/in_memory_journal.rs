use crate::common::{EventEnvelope, EventJournal};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// In-memory journal for tests and runs without persistence.
#[derive(Debug, Default)]
pub struct InMemoryEventJournal {
    events: RwLock<Vec<EventEnvelope>>,
}

impl InMemoryEventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventJournal for InMemoryEventJournal {
    async fn append(&self, events: Vec<EventEnvelope>) -> Result<(), String> {
        self.events.write().await.extend(events);
        Ok(())
    }

    async fn load_subject(&self, subject_id: &str) -> Result<Vec<EventEnvelope>, String> {
        let store = self.events.read().await;
        Ok(store
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn load_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        let store = self.events.read().await;
        let mut events: Vec<EventEnvelope> = store
            .iter()
            .filter(|e| e.event_type == event_type)
            .filter(|e| from_timestamp.map_or(true, |from| e.occurred_at >= from))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        Ok(events)
    }
}
