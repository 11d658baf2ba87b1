use crate::common::{DomainEvent, Vector3};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrackingEvent {
    ObserverRegistered {
        entity_id: String,
        position: Vector3,
        timestamp: DateTime<Utc>,
    },
    EntityRegistered {
        entity_id: String,
        position: Vector3,
        timestamp: DateTime<Utc>,
    },
    EntityMoved {
        entity_id: String,
        previous_position: Vector3,
        current_position: Vector3,
        is_observer: bool,
        timestamp: DateTime<Utc>,
    },
    EntityStale {
        entity_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A stale entity whose handle the world reports as valid again.
    EntityRevalidated {
        entity_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for TrackingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TrackingEvent::ObserverRegistered { .. } => "ObserverRegistered",
            TrackingEvent::EntityRegistered { .. } => "EntityRegistered",
            TrackingEvent::EntityMoved { .. } => "EntityMoved",
            TrackingEvent::EntityStale { .. } => "EntityStale",
            TrackingEvent::EntityRevalidated { .. } => "EntityRevalidated",
        }
    }

    fn subject_id(&self) -> &str {
        match self {
            TrackingEvent::ObserverRegistered { entity_id, .. } => entity_id,
            TrackingEvent::EntityRegistered { entity_id, .. } => entity_id,
            TrackingEvent::EntityMoved { entity_id, .. } => entity_id,
            TrackingEvent::EntityStale { entity_id, .. } => entity_id,
            TrackingEvent::EntityRevalidated { entity_id, .. } => entity_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TrackingEvent::ObserverRegistered { timestamp, .. } => *timestamp,
            TrackingEvent::EntityRegistered { timestamp, .. } => *timestamp,
            TrackingEvent::EntityMoved { timestamp, .. } => *timestamp,
            TrackingEvent::EntityStale { timestamp, .. } => *timestamp,
            TrackingEvent::EntityRevalidated { timestamp, .. } => *timestamp,
        }
    }
}
