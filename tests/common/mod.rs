#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use storygen_app::common::Vector3;
use storygen_app::domains::logger::DomainLogger;
use storygen_app::domains::relativity::{ObservationEvent, RelativeDirection, RelativePosition};
use storygen_app::domains::tracking::{EntityKind, WorldObject, WorldQuery};

struct WorldState {
    observer: Option<(String, Vector3)>,
    forward: Vector3,
    right: Vector3,
    objects: Vec<WorldObject>,
    unreadable: HashSet<String>,
    removed: HashSet<String>,
}

/// Hand-driven world: the observer faces +X with +Y to its right.
pub struct MockWorld {
    state: Mutex<WorldState>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::with_observer(Some("player"))
    }

    pub fn without_observer() -> Self {
        Self::with_observer(None)
    }

    fn with_observer(observer: Option<&str>) -> Self {
        Self {
            state: Mutex::new(WorldState {
                observer: observer.map(|id| (id.to_string(), Vector3::ZERO)),
                forward: Vector3::FORWARD,
                right: Vector3::RIGHT,
                objects: Vec::new(),
                unreadable: HashSet::new(),
                removed: HashSet::new(),
            }),
        }
    }

    /// Adds a tracked prop with a type tag and a small extent.
    pub fn add_prop(&self, id: &str, position: Vector3) {
        self.add_object(WorldObject {
            id: id.to_string(),
            name: id.to_string(),
            position,
            extent: Vector3::new(10.0, 10.0, 10.0),
            tags: vec!["Type: prop".to_string()],
            kind: EntityKind::Prop,
        });
    }

    pub fn add_object(&self, object: WorldObject) {
        self.state.lock().unwrap().objects.push(object);
    }

    pub fn move_to(&self, id: &str, position: Vector3) {
        let mut state = self.state.lock().unwrap();
        if let Some((observer_id, observer_position)) = state.observer.as_mut() {
            if observer_id == id {
                *observer_position = position;
                return;
            }
        }
        let object = state.objects.iter_mut().find(|o| o.id == id).unwrap();
        object.position = position;
    }

    pub fn set_basis(&self, forward: Vector3, right: Vector3) {
        let mut state = self.state.lock().unwrap();
        state.forward = forward;
        state.right = right;
    }

    pub fn remove(&self, id: &str) {
        self.state.lock().unwrap().removed.insert(id.to_string());
    }

    pub fn restore(&self, id: &str) {
        self.state.lock().unwrap().removed.remove(id);
    }

    pub fn make_unreadable(&self, id: &str) {
        self.state.lock().unwrap().unreadable.insert(id.to_string());
    }
}

impl WorldQuery for MockWorld {
    fn observer_id(&self) -> Option<String> {
        self.state.lock().unwrap().observer.as_ref().map(|(id, _)| id.clone())
    }

    fn observer_position(&self) -> Vector3 {
        self.state
            .lock()
            .unwrap()
            .observer
            .as_ref()
            .map(|(_, p)| *p)
            .unwrap_or(Vector3::ZERO)
    }

    fn observer_forward(&self) -> Vector3 {
        self.state.lock().unwrap().forward
    }

    fn observer_right(&self) -> Vector3 {
        self.state.lock().unwrap().right
    }

    fn enumerate_world_objects(&self) -> Vec<WorldObject> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .iter()
            .filter(|o| !state.removed.contains(&o.id))
            .cloned()
            .collect()
    }

    fn entity_position(&self, id: &str) -> Option<Vector3> {
        let state = self.state.lock().unwrap();
        if state.unreadable.contains(id) || state.removed.contains(id) {
            return None;
        }
        if let Some((observer_id, position)) = &state.observer {
            if observer_id == id {
                return Some(*position);
            }
        }
        state.objects.iter().find(|o| o.id == id).map(|o| o.position)
    }

    fn is_entity_still_valid(&self, id: &str) -> bool {
        !self.state.lock().unwrap().removed.contains(id)
    }
}

/// Logger that keeps every line, prefixed with its level.
#[derive(Default)]
pub struct CaptureLogger {
    pub messages: Mutex<Vec<String>>,
}

impl CaptureLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

impl DomainLogger for CaptureLogger {
    fn info(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("INFO:{}", msg));
    }

    fn warn(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("WARN:{}", msg));
    }

    fn error(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("ERR:{}", msg));
    }

    fn debug(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("DEBUG:{}", msg));
    }
}

pub fn observation(target: &str) -> ObservationEvent {
    ObservationEvent::new(
        target,
        100.0,
        RelativePosition::Spatial(RelativeDirection::DirectlyInFront),
        chrono::Utc::now(),
    )
}
