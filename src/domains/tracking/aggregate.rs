use super::events::TrackingEvent;
use super::ports::{EntityKind, WorldQuery};
use crate::common::{AggregateRoot, DomainError, DomainEvent, DomainResult, Vector3, KINDA_SMALL_NUMBER};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub id: String,
    pub is_observer: bool,
    pub previous_position: Vector3,
    /// Set while the world reports the backing handle as gone.
    #[serde(default)]
    pub stale: bool,
}

/// Outcome of one sampling pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleReport {
    pub sampled: usize,
    pub moved: usize,
    /// Entities whose handle the world no longer considers valid.
    pub stale: Vec<String>,
    /// Entities that were valid but whose position could not be read.
    pub invalid: Vec<String>,
}

/// Tracked set of the observer and world objects, in registration order.
#[derive(Debug, Clone)]
pub struct EntityTracker {
    id: String,
    entities: Vec<TrackedEntity>,
    position_epsilon: f64,
    version: u64,
    uncommitted_events: Vec<TrackingEvent>,
}

impl Default for EntityTracker {
    fn default() -> Self {
        Self::new(KINDA_SMALL_NUMBER)
    }
}

impl EntityTracker {
    pub fn new(position_epsilon: f64) -> Self {
        Self {
            id: "entity-tracker".to_string(),
            entities: Vec::new(),
            position_epsilon,
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn entities(&self) -> &[TrackedEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TrackedEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn observer(&self) -> Option<&TrackedEntity> {
        self.entities.iter().find(|e| e.is_observer)
    }

    /// Adds the unique observer. A second observer is rejected and the first
    /// one stays in place.
    pub fn register_observer(&mut self, id: &str, position: Vector3) -> DomainResult<()> {
        if let Some(existing) = self.observer() {
            return Err(DomainError::DuplicateObserver {
                existing: existing.id.clone(),
                rejected: id.to_string(),
            });
        }
        self.ensure_unique(id)?;

        let event = TrackingEvent::ObserverRegistered {
            entity_id: id.to_string(),
            position,
            timestamp: Utc::now(),
        };
        self.apply(&event)?;
        self.add_event(event);
        Ok(())
    }

    /// Adds a non-observer entity. Returns `Ok(false)` when `kind` marks the
    /// object as part of the player rig and it is therefore not tracked.
    pub fn register_entity(&mut self, id: &str, position: Vector3, kind: EntityKind) -> DomainResult<bool> {
        if !kind.is_trackable() {
            return Ok(false);
        }
        self.ensure_unique(id)?;

        let event = TrackingEvent::EntityRegistered {
            entity_id: id.to_string(),
            position,
            timestamp: Utc::now(),
        };
        self.apply(&event)?;
        self.add_event(event);
        Ok(true)
    }

    /// Registers the world's observer followed by every trackable object, in
    /// enumeration order. Returns the number of non-observer entities tracked.
    pub fn register_from_world(&mut self, world: &dyn WorldQuery) -> DomainResult<usize> {
        let observer_id = world.observer_id();
        if let Some(id) = &observer_id {
            if self.observer().is_none() {
                self.register_observer(id, world.observer_position())?;
            }
        }

        let mut tracked = 0;
        for object in world.enumerate_world_objects() {
            if observer_id.as_deref() == Some(object.id.as_str()) || self.get(&object.id).is_some() {
                continue;
            }
            if self.register_entity(&object.id, object.position, object.kind)? {
                tracked += 1;
            }
        }
        Ok(tracked)
    }

    /// Reads every entity's live position and records an `EntityMoved` event
    /// for each one that moved beyond the epsilon. One bad entity never stops
    /// the pass.
    pub fn sample(&mut self, world: &dyn WorldQuery) -> SampleReport {
        let mut report = SampleReport::default();
        let mut events = Vec::new();

        for entity in &self.entities {
            if !world.is_entity_still_valid(&entity.id) {
                if !entity.stale {
                    events.push(TrackingEvent::EntityStale {
                        entity_id: entity.id.clone(),
                        timestamp: Utc::now(),
                    });
                }
                report.stale.push(entity.id.clone());
                continue;
            }
            if entity.stale {
                events.push(TrackingEvent::EntityRevalidated {
                    entity_id: entity.id.clone(),
                    timestamp: Utc::now(),
                });
            }

            let Some(current) = world.entity_position(&entity.id) else {
                report.invalid.push(entity.id.clone());
                continue;
            };
            report.sampled += 1;

            if !current.abs_diff_eq(&entity.previous_position, self.position_epsilon) {
                events.push(TrackingEvent::EntityMoved {
                    entity_id: entity.id.clone(),
                    previous_position: entity.previous_position,
                    current_position: current,
                    is_observer: entity.is_observer,
                    timestamp: Utc::now(),
                });
            }
        }

        for event in events {
            if let Err(e) = self.apply(&event) {
                debug_assert!(false, "sampled event did not apply: {}", e);
                report.invalid.push(event.subject_id().to_string());
                continue;
            }
            if matches!(event, TrackingEvent::EntityMoved { .. }) {
                report.moved += 1;
            }
            self.add_event(event);
        }
        report
    }

    fn ensure_unique(&self, id: &str) -> DomainResult<()> {
        if self.get(id).is_some() {
            return Err(DomainError::DuplicateEntity { id: id.to_string() });
        }
        Ok(())
    }

    fn entity_mut(&mut self, id: &str) -> DomainResult<&mut TrackedEntity> {
        self.entities
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| DomainError::InvalidTarget { id: id.to_string() })
    }
}

impl AggregateRoot for EntityTracker {
    type Event = TrackingEvent;

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        match event {
            TrackingEvent::ObserverRegistered { entity_id, position, .. } => {
                self.entities.push(TrackedEntity {
                    id: entity_id.clone(),
                    is_observer: true,
                    previous_position: *position,
                    stale: false,
                });
            }
            TrackingEvent::EntityRegistered { entity_id, position, .. } => {
                self.entities.push(TrackedEntity {
                    id: entity_id.clone(),
                    is_observer: false,
                    previous_position: *position,
                    stale: false,
                });
            }
            TrackingEvent::EntityMoved { entity_id, current_position, .. } => {
                let entity = self.entity_mut(entity_id)?;
                entity.previous_position = *current_position;
                entity.stale = false;
            }
            TrackingEvent::EntityStale { entity_id, .. } => {
                self.entity_mut(entity_id)?.stale = true;
            }
            TrackingEvent::EntityRevalidated { entity_id, .. } => {
                self.entity_mut(entity_id)?.stale = false;
            }
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    fn add_event(&mut self, event: Self::Event) {
        self.uncommitted_events.push(event);
    }
}
