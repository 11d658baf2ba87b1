use crate::common::{DomainError, DomainEvent, DomainResult};
use crate::domains::environment::EnvironmentSnapshot;
use crate::domains::relativity::ObservationEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "Use the JSON payload to tell the story of the game it comes from, \
from the wanderer's point of view in third person. Focus on the latest entries in event_history to \
understand what changed since start_environment. Do not introduce concepts outside the given data. \
If prior_responses are present, continue that story. Get straight to the story.";

/// Record handed to the LLM on every flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationPayload {
    pub start_environment: EnvironmentSnapshot,
    pub current_environment: EnvironmentSnapshot,
    pub event_history: Vec<ObservationEvent>,
    pub prior_responses: Vec<String>,
}

impl NarrationPayload {
    /// Rejects numbers JSON cannot carry. `serde_json` would quietly write
    /// them as `null`, so they are caught here instead.
    pub fn validate(&self) -> DomainResult<()> {
        let snapshots = [
            ("start_environment", &self.start_environment),
            ("current_environment", &self.current_environment),
        ];
        for (field, snapshot) in snapshots {
            if let Some(path) = snapshot.first_non_finite() {
                return Err(DomainError::SerializationFailure {
                    reason: format!("non-finite value in {}.{}", field, path),
                });
            }
        }
        if let Some(event) = self.event_history.iter().find(|e| !e.distance.is_finite()) {
            return Err(DomainError::SerializationFailure {
                reason: format!("non-finite distance for {}", event.target_id),
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> DomainResult<String> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationRequest {
    /// 1-based flush number within the session.
    pub sequence: u64,
    pub system_prompt: String,
    pub payload: NarrationPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NarrationEvent {
    FlushDispatched {
        sequence: u64,
        event_count: usize,
        timestamp: DateTime<Utc>,
    },
    ResponseReceived {
        sequence: u64,
        text: String,
        timestamp: DateTime<Utc>,
    },
    DispatchFailed {
        sequence: u64,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    SummaryDispatched {
        player_count: usize,
        object_count: usize,
        timestamp: DateTime<Utc>,
    },
    SummaryReceived {
        text: String,
        timestamp: DateTime<Utc>,
    },
    SummaryFailed {
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for NarrationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            NarrationEvent::FlushDispatched { .. } => "FlushDispatched",
            NarrationEvent::ResponseReceived { .. } => "ResponseReceived",
            NarrationEvent::DispatchFailed { .. } => "DispatchFailed",
            NarrationEvent::SummaryDispatched { .. } => "SummaryDispatched",
            NarrationEvent::SummaryReceived { .. } => "SummaryReceived",
            NarrationEvent::SummaryFailed { .. } => "SummaryFailed",
        }
    }

    fn subject_id(&self) -> &str {
        "narration"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            NarrationEvent::FlushDispatched { timestamp, .. } => *timestamp,
            NarrationEvent::ResponseReceived { timestamp, .. } => *timestamp,
            NarrationEvent::DispatchFailed { timestamp, .. } => *timestamp,
            NarrationEvent::SummaryDispatched { timestamp, .. } => *timestamp,
            NarrationEvent::SummaryReceived { timestamp, .. } => *timestamp,
            NarrationEvent::SummaryFailed { timestamp, .. } => *timestamp,
        }
    }
}
