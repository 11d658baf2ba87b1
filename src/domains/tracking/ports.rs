use crate::common::Vector3;
use serde::{Deserialize, Serialize};

/// Role the world assigns to an object. Only `Prop` objects are tracked as
/// targets; the others describe the player rig and are never classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Prop,
    Observer,
    Camera,
    CameraManager,
    Character,
}

impl EntityKind {
    pub fn is_trackable(&self) -> bool {
        matches!(self, EntityKind::Prop)
    }
}

/// One object as enumerated by the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: String,
    /// Display label; falls back to `id` when empty.
    #[serde(default)]
    pub name: String,
    pub position: Vector3,
    /// Half-size of the object's bounding box.
    #[serde(default)]
    pub extent: Vector3,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub kind: EntityKind,
}

impl WorldObject {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Port the tracking and environment domains use to read the game world.
pub trait WorldQuery: Send + Sync {
    fn observer_id(&self) -> Option<String>;
    fn observer_position(&self) -> Vector3;
    /// Unit forward axis of the observer.
    fn observer_forward(&self) -> Vector3;
    /// Unit right axis of the observer.
    fn observer_right(&self) -> Vector3;
    fn observer_up(&self) -> Vector3 {
        Vector3::UP
    }
    fn enumerate_world_objects(&self) -> Vec<WorldObject>;
    /// Current position of a live entity, `None` when the handle cannot be resolved.
    fn entity_position(&self, id: &str) -> Option<Vector3>;
    fn is_entity_still_valid(&self, id: &str) -> bool;
}
