use crate::common::{DomainError, DomainResult, Vector3};
use crate::domains::environment::WorldMetadata;
use crate::domains::tracking::{EntityKind, WorldObject, WorldQuery};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SUMMARY_PROMPT: &str =
    "Write a short story using the following details without explaining your process.";

/// How an object can take part in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectRole {
    Interactable,
    Movable,
    Static,
}

impl ObjectRole {
    /// `Interactable` and `Movable` tags win in that order; untagged objects
    /// are static.
    pub fn of(object: &WorldObject) -> Self {
        let tagged = |name: &str| object.tags.iter().any(|t| t.trim().eq_ignore_ascii_case(name));
        if tagged("Interactable") {
            ObjectRole::Interactable
        } else if tagged("Movable") {
            ObjectRole::Movable
        } else {
            ObjectRole::Static
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub id: String,
    pub position: Vector3,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ObjectRole>,
}

/// Whole-world overview sent once when a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSummary {
    pub game_title: String,
    pub theme: String,
    pub description: String,
    /// The observer first, then every character.
    pub players: Vec<SummaryEntry>,
    pub objects: Vec<SummaryEntry>,
}

impl WorldSummary {
    pub fn from_world(world: &dyn WorldQuery, metadata: &WorldMetadata) -> Self {
        let observer_id = world.observer_id();
        let mut players = Vec::new();
        if let Some(id) = &observer_id {
            players.push(SummaryEntry {
                id: id.clone(),
                position: world.observer_position(),
                role: None,
            });
        }

        let mut objects = Vec::new();
        for object in world.enumerate_world_objects() {
            if observer_id.as_deref() == Some(object.id.as_str()) {
                continue;
            }
            match object.kind {
                EntityKind::Observer => {}
                EntityKind::Character => players.push(SummaryEntry {
                    id: object.display_name().to_string(),
                    position: object.position,
                    role: None,
                }),
                _ => objects.push(SummaryEntry {
                    id: object.display_name().to_string(),
                    position: object.position,
                    role: Some(ObjectRole::of(&object)),
                }),
            }
        }

        Self {
            game_title: metadata.title.clone(),
            theme: metadata.theme.clone(),
            description: metadata.description.clone(),
            players,
            objects,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(entry) = self.players.iter().chain(&self.objects).find(|e| !e.position.is_finite()) {
            return Err(DomainError::SerializationFailure {
                reason: format!("non-finite position for {}", entry.id),
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
pub struct SummaryRequest {
    pub system_prompt: String,
    pub summary: WorldSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(tags: &[&str]) -> WorldObject {
        WorldObject {
            id: "lever-1".into(),
            name: String::new(),
            position: Vector3::ZERO,
            extent: Vector3::ZERO,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            kind: EntityKind::Prop,
        }
    }

    #[test]
    fn interactable_tag_wins_over_movable() {
        assert_eq!(ObjectRole::of(&object(&["movable", "Interactable"])), ObjectRole::Interactable);
        assert_eq!(ObjectRole::of(&object(&["Movable"])), ObjectRole::Movable);
        assert_eq!(ObjectRole::of(&object(&["Type: lever"])), ObjectRole::Static);
    }
}
