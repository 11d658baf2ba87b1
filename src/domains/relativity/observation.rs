use super::classifier::{AxisProjections, RelativePosition, RelativePositionClassifier};
use crate::common::{DomainEvent, Vector3};
use crate::domains::tracking::WorldQuery;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PROXIMITY_THRESHOLD: f64 = 800.0;

/// Observer position and orientation at sample time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverFrame {
    pub position: Vector3,
    pub forward: Vector3,
    pub right: Vector3,
    pub up: Vector3,
}

impl ObserverFrame {
    pub fn from_world(world: &dyn WorldQuery) -> Self {
        Self {
            position: world.observer_position(),
            forward: world.observer_forward(),
            right: world.observer_right(),
            up: world.observer_up(),
        }
    }

    /// Distance and axis projections of `target` seen from this frame. A target
    /// on top of the observer projects to all zeros.
    pub fn measure(&self, target: Vector3) -> Measurement {
        let relative = target - self.position;
        let direction = relative.normalize();
        Measurement {
            relative,
            distance: relative.length(),
            projections: AxisProjections {
                forward: self.forward.dot(&direction),
                right: self.right.dot(&direction),
                vertical: self.up.dot(&direction),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub relative: Vector3,
    pub distance: f64,
    pub projections: AxisProjections,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityGate {
    pub threshold: f64,
}

impl Default for ProximityGate {
    fn default() -> Self {
        Self {
            threshold: PROXIMITY_THRESHOLD,
        }
    }
}

impl ProximityGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn admits(&self, distance: f64) -> bool {
        distance < self.threshold
    }
}

/// One classified movement close enough to the player to be narrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEvent {
    pub event_id: Uuid,
    pub target_id: String,
    pub distance: f64,
    pub label: String,
    pub relative_position: String,
    pub timestamp: DateTime<Utc>,
}

impl ObservationEvent {
    pub fn new(target_id: &str, distance: f64, position: RelativePosition, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            target_id: target_id.to_string(),
            distance,
            label: position.label().to_string(),
            relative_position: position.sentence(),
            timestamp,
        }
    }
}

impl DomainEvent for ObservationEvent {
    fn event_type(&self) -> &'static str {
        "ObservationRecorded"
    }

    fn subject_id(&self) -> &str {
        &self.target_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Gates a measurement by distance and turns it into an [`ObservationEvent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventBuilder {
    pub classifier: RelativePositionClassifier,
    pub gate: ProximityGate,
}

impl EventBuilder {
    pub fn new(classifier: RelativePositionClassifier, gate: ProximityGate) -> Self {
        Self { classifier, gate }
    }

    pub fn build(&self, target_id: &str, measurement: &Measurement) -> Option<ObservationEvent> {
        if !self.gate.admits(measurement.distance) {
            return None;
        }
        let position = self.classifier.classify(measurement.projections);
        Some(ObservationEvent::new(target_id, measurement.distance, position, Utc::now()))
    }
}
