use super::snapshot::{EnvironmentObject, EnvironmentSnapshot, WorldMetadata};
use crate::common::{Vector3, KINDA_SMALL_NUMBER};
use crate::domains::tracking::{WorldObject, WorldQuery};

pub const TYPE_TAG: &str = "Type:";
pub const DESCRIPTION_TAG: &str = "Description:";
pub const INTERACTABLE_TAG: &str = "Interactable:";

pub const DEFAULT_DESCRIPTION: &str = "No description available";
pub const DEFAULT_TYPE: &str = "generic";

pub const MAX_OBJECT_EXTENT: f64 = 10_000.0;

pub fn default_name_denylist() -> Vec<String> {
    ["floor", "wall", "light", "debug", "volume"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Tag-encoded metadata of a world object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTags {
    pub object_type: Option<String>,
    pub description: Option<String>,
    pub interactable: Option<String>,
}

impl ObjectTags {
    /// Parses `Prefix: value` tags; the last tag of each kind wins.
    pub fn parse(tags: &[String]) -> Self {
        let mut parsed = ObjectTags {
            object_type: None,
            description: None,
            interactable: None,
        };
        for tag in tags {
            if let Some(value) = tag.strip_prefix(DESCRIPTION_TAG) {
                parsed.description = Some(value.trim().to_string());
            } else if let Some(value) = tag.strip_prefix(TYPE_TAG) {
                parsed.object_type = Some(value.trim().to_string());
            } else if let Some(value) = tag.strip_prefix(INTERACTABLE_TAG) {
                parsed.interactable = Some(value.trim().to_string());
            }
        }
        parsed
    }

    pub fn interactable(&self) -> bool {
        self.interactable
            .as_deref()
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// Builds point-in-time descriptions of the world from its tagged objects.
#[derive(Debug, Clone)]
pub struct EnvironmentSnapshotter {
    pub metadata: WorldMetadata,
    /// Substrings matched case-insensitively against object names.
    pub name_denylist: Vec<String>,
    pub max_extent: f64,
}

impl EnvironmentSnapshotter {
    pub fn new(metadata: WorldMetadata) -> Self {
        Self {
            metadata,
            name_denylist: default_name_denylist(),
            max_extent: MAX_OBJECT_EXTENT,
        }
    }

    pub fn snapshot(&self, world: &dyn WorldQuery) -> EnvironmentSnapshot {
        self.snapshot_objects(&world.enumerate_world_objects())
    }

    pub fn snapshot_objects(&self, objects: &[WorldObject]) -> EnvironmentSnapshot {
        let included = objects.iter().filter_map(|o| self.describe(o)).collect();
        EnvironmentSnapshot::new(&self.metadata, included)
    }

    /// `None` when the object is untyped, denylisted, or has implausible bounds.
    pub fn describe(&self, object: &WorldObject) -> Option<EnvironmentObject> {
        let tags = ObjectTags::parse(&object.tags);
        let object_type = tags.object_type.clone()?;

        if !self.has_plausible_bounds(&object.extent) || self.is_denylisted(object.display_name()) {
            return None;
        }

        let interactable = tags.interactable();
        Some(EnvironmentObject {
            name: object.display_name().to_string(),
            description: tags
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            object_type: if object_type.is_empty() {
                DEFAULT_TYPE.to_string()
            } else {
                object_type
            },
            interactable,
            position: object.position,
            dimensions: object.extent * 2.0,
        })
    }

    fn has_plausible_bounds(&self, extent: &Vector3) -> bool {
        !extent.is_nearly_zero(KINDA_SMALL_NUMBER) && extent.max_component() <= self.max_extent
    }

    fn is_denylisted(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.name_denylist
            .iter()
            .any(|needle| lower.contains(&needle.to_lowercase()))
    }
}
