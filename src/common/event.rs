use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub trait DomainEvent: Send + Sync + Clone {
    fn event_type(&self) -> &'static str;
    /// Id of the entity (or pipeline) the event is about.
    fn subject_id(&self) -> &str;
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Journal record wrapping any serialized [`DomainEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub subject_id: String,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub source: String,
    pub occurred_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new<E: DomainEvent + Serialize>(event: &E, source: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_id: Uuid::new_v4(),
            subject_id: event.subject_id().to_string(),
            event_type: event.event_type().to_string(),
            event_data: serde_json::to_value(event)?,
            source: source.to_string(),
            occurred_at: event.occurred_at(),
        })
    }
}

/// Append-only log of pipeline events, keyed by subject.
#[async_trait::async_trait]
pub trait EventJournal: Send + Sync {
    async fn append(&self, events: Vec<EventEnvelope>) -> Result<(), String>;

    async fn load_subject(&self, subject_id: &str) -> Result<Vec<EventEnvelope>, String>;

    async fn load_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String>;
}
