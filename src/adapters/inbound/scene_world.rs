use crate::common::{DomainError, DomainResult, Vector3};
use crate::domains::environment::WorldMetadata;
use crate::domains::tracking::{EntityKind, WorldObject, WorldQuery};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Scripted movement applied by [`SceneWorld::advance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Motion {
    /// Constant velocity in units per second.
    Linear { velocity: Vector3 },
    /// Circle in the horizontal plane around `center`.
    Orbit {
        center: Vector3,
        radius: f64,
        /// Radians per second.
        angular_speed: f64,
    },
    /// Random horizontal heading each step.
    Wander { speed: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObserver {
    pub id: String,
    pub position: Vector3,
    #[serde(default = "default_forward")]
    pub forward: Vector3,
    #[serde(default = "default_right")]
    pub right: Vector3,
    #[serde(default = "default_up")]
    pub up: Vector3,
}

fn default_forward() -> Vector3 {
    Vector3::FORWARD
}

fn default_right() -> Vector3 {
    Vector3::RIGHT
}

fn default_up() -> Vector3 {
    Vector3::UP
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(flatten)]
    pub object: WorldObject,
    #[serde(default)]
    pub motion: Option<Motion>,
}

/// On-disk scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub metadata: WorldMetadata,
    #[serde(default)]
    pub observer: Option<SceneObserver>,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

#[derive(Debug)]
struct SceneEntry {
    object: WorldObject,
    motion: Option<Motion>,
    phase: f64,
    removed: bool,
}

#[derive(Debug)]
struct SceneState {
    observer: Option<SceneObserver>,
    entries: Vec<SceneEntry>,
}

/// World backed by a scene file, for running the pipeline outside an engine.
/// Positions change through scripted motion or explicit moves.
#[derive(Debug)]
pub struct SceneWorld {
    metadata: WorldMetadata,
    state: RwLock<SceneState>,
}

impl SceneWorld {
    pub fn from_scene(scene: SceneFile) -> Self {
        let entries = scene
            .objects
            .into_iter()
            .map(|o| {
                let phase = match &o.motion {
                    Some(Motion::Orbit { center, .. }) => {
                        let offset = o.object.position - *center;
                        offset.y.atan2(offset.x)
                    }
                    _ => 0.0,
                };
                SceneEntry {
                    object: o.object,
                    motion: o.motion,
                    phase,
                    removed: false,
                }
            })
            .collect();
        let observer = scene.observer.map(|mut observer| {
            observer.forward = observer.forward.normalize();
            observer.right = observer.right.normalize();
            observer.up = observer.up.normalize();
            observer
        });
        Self {
            metadata: scene.metadata,
            state: RwLock::new(SceneState { observer, entries }),
        }
    }

    pub fn from_json(json: &str) -> DomainResult<Self> {
        let scene: SceneFile = serde_json::from_str(json)
            .map_err(|e| DomainError::InfrastructureError(format!("Invalid scene: {}", e)))?;
        Ok(Self::from_scene(scene))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DomainError::InfrastructureError(format!("Failed to read scene {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn metadata(&self) -> &WorldMetadata {
        &self.metadata
    }

    /// Steps every scripted motion forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let dt = delta.as_secs_f64();
        let mut rng = rand::thread_rng();
        let mut state = self.write_state();
        for entry in state.entries.iter_mut().filter(|e| !e.removed) {
            let Some(motion) = &entry.motion else {
                continue;
            };
            match motion {
                Motion::Linear { velocity } => {
                    entry.object.position = entry.object.position + *velocity * dt;
                }
                Motion::Orbit {
                    center,
                    radius,
                    angular_speed,
                } => {
                    entry.phase += angular_speed * dt;
                    entry.object.position = Vector3::new(
                        center.x + radius * entry.phase.cos(),
                        center.y + radius * entry.phase.sin(),
                        entry.object.position.z,
                    );
                }
                Motion::Wander { speed } => {
                    let heading = rng.gen_range(0.0..std::f64::consts::TAU);
                    let step = Vector3::new(heading.cos(), heading.sin(), 0.0) * (speed * dt);
                    entry.object.position = entry.object.position + step;
                }
            }
        }
    }

    pub fn set_position(&self, id: &str, position: Vector3) -> DomainResult<()> {
        let mut state = self.write_state();
        if let Some(observer) = state.observer.as_mut().filter(|o| o.id == id) {
            observer.position = position;
            return Ok(());
        }
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.object.id == id && !e.removed)
            .ok_or_else(|| DomainError::InvalidTarget { id: id.to_string() })?;
        entry.object.position = position;
        Ok(())
    }

    /// Replaces the observer basis. Both axes are normalized.
    pub fn set_observer_orientation(&self, forward: Vector3, right: Vector3) -> DomainResult<()> {
        let mut state = self.write_state();
        let observer = state.observer.as_mut().ok_or(DomainError::MissingObserver)?;
        observer.forward = forward.normalize();
        observer.right = right.normalize();
        Ok(())
    }

    pub fn add_object(&self, object: WorldObject, motion: Option<Motion>) {
        self.write_state().entries.push(SceneEntry {
            object,
            motion,
            phase: 0.0,
            removed: false,
        });
    }

    /// Destroys an object; its handle becomes invalid.
    pub fn remove_object(&self, id: &str) -> bool {
        let mut state = self.write_state();
        match state.entries.iter_mut().find(|e| e.object.id == id && !e.removed) {
            Some(entry) => {
                entry.removed = true;
                true
            }
            None => false,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SceneState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SceneState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WorldQuery for SceneWorld {
    fn observer_id(&self) -> Option<String> {
        self.read_state().observer.as_ref().map(|o| o.id.clone())
    }

    fn observer_position(&self) -> Vector3 {
        self.read_state()
            .observer
            .as_ref()
            .map(|o| o.position)
            .unwrap_or(Vector3::ZERO)
    }

    fn observer_forward(&self) -> Vector3 {
        self.read_state()
            .observer
            .as_ref()
            .map(|o| o.forward)
            .unwrap_or(Vector3::FORWARD)
    }

    fn observer_right(&self) -> Vector3 {
        self.read_state()
            .observer
            .as_ref()
            .map(|o| o.right)
            .unwrap_or(Vector3::RIGHT)
    }

    fn observer_up(&self) -> Vector3 {
        self.read_state()
            .observer
            .as_ref()
            .map(|o| o.up)
            .unwrap_or(Vector3::UP)
    }

    fn enumerate_world_objects(&self) -> Vec<WorldObject> {
        let state = self.read_state();
        let observer = state.observer.as_ref().map(|o| WorldObject {
            id: o.id.clone(),
            name: o.id.clone(),
            position: o.position,
            extent: Vector3::ZERO,
            tags: Vec::new(),
            kind: EntityKind::Observer,
        });
        observer
            .into_iter()
            .chain(
                state
                    .entries
                    .iter()
                    .filter(|e| !e.removed)
                    .map(|e| e.object.clone()),
            )
            .collect()
    }

    fn entity_position(&self, id: &str) -> Option<Vector3> {
        let state = self.read_state();
        if let Some(observer) = state.observer.as_ref().filter(|o| o.id == id) {
            return Some(observer.position);
        }
        state
            .entries
            .iter()
            .find(|e| e.object.id == id && !e.removed)
            .map(|e| e.object.position)
    }

    fn is_entity_still_valid(&self, id: &str) -> bool {
        let state = self.read_state();
        state.observer.as_ref().is_some_and(|o| o.id == id)
            || state.entries.iter().any(|e| e.object.id == id && !e.removed)
    }
}
