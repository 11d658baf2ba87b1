use crate::common::Vector3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldMetadata {
    pub title: String,
    pub theme: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentObject {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub interactable: bool,
    pub position: Vector3,
    /// Full size (twice the bounds extent).
    pub dimensions: Vector3,
}

/// Axis-aligned box enclosing every object in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceBounds {
    pub min: Vector3,
    pub max: Vector3,
    pub dimensions: Vector3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub snapshot_id: Uuid,
    pub title: String,
    pub theme: String,
    pub description: String,
    pub space: Option<SpaceBounds>,
    pub objects: Vec<EnvironmentObject>,
    pub captured_at: DateTime<Utc>,
}

impl EnvironmentSnapshot {
    pub fn new(metadata: &WorldMetadata, objects: Vec<EnvironmentObject>) -> Self {
        let space = Self::enclosing_space(&objects);
        Self {
            snapshot_id: Uuid::new_v4(),
            title: metadata.title.clone(),
            theme: metadata.theme.clone(),
            description: metadata.description.clone(),
            space,
            objects,
            captured_at: Utc::now(),
        }
    }

    pub fn object(&self, name: &str) -> Option<&EnvironmentObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    fn enclosing_space(objects: &[EnvironmentObject]) -> Option<SpaceBounds> {
        let first = objects.first()?;
        let half = |o: &EnvironmentObject| o.dimensions * 0.5;
        let (min, max) = objects.iter().fold(
            (first.position - half(first), first.position + half(first)),
            |(min, max), o| {
                (
                    min.component_min(&(o.position - half(o))),
                    max.component_max(&(o.position + half(o))),
                )
            },
        );
        Some(SpaceBounds {
            min,
            max,
            dimensions: max - min,
        })
    }

    /// Name of the first number that JSON cannot represent, if any.
    pub fn first_non_finite(&self) -> Option<String> {
        if let Some(space) = &self.space {
            if !(space.min.is_finite() && space.max.is_finite()) {
                return Some("space".to_string());
            }
        }
        self.objects
            .iter()
            .find(|o| !(o.position.is_finite() && o.dimensions.is_finite()))
            .map(|o| format!("objects[{}]", o.name))
    }
}
