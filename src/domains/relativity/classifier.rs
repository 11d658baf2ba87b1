//! Discrete description of where a target sits relative to the observer.
//!
//! The classifier works on three dot products of unit vectors (observer axis ·
//! direction to target), so every input lies in `[-1, 1]`. The checks run in a
//! fixed order and the first match wins; that order is the tie-break policy.

use serde::{Deserialize, Serialize};

pub const VERTICAL_THRESHOLD: f64 = 0.8;
pub const HORIZONTAL_THRESHOLD: f64 = 0.8;

/// Projections of the unit observer→target vector on the observer's axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisProjections {
    pub forward: f64,
    pub right: f64,
    pub vertical: f64,
}

impl AxisProjections {
    pub fn new(forward: f64, right: f64, vertical: f64) -> Self {
        Self { forward, right, vertical }
    }
}

/// The 14 labels of the three-axis classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelativeDirection {
    DirectlyAbove,
    DirectlyBelow,
    DirectlyRight,
    DirectlyLeft,
    DirectlyInFront,
    DirectlyBehind,
    FrontRightAbove,
    FrontRightBelow,
    FrontLeftAbove,
    FrontLeftBelow,
    BehindRightAbove,
    BehindRightBelow,
    BehindLeftAbove,
    BehindLeftBelow,
}

impl RelativeDirection {
    pub const ALL: [RelativeDirection; 14] = [
        RelativeDirection::DirectlyAbove,
        RelativeDirection::DirectlyBelow,
        RelativeDirection::DirectlyRight,
        RelativeDirection::DirectlyLeft,
        RelativeDirection::DirectlyInFront,
        RelativeDirection::DirectlyBehind,
        RelativeDirection::FrontRightAbove,
        RelativeDirection::FrontRightBelow,
        RelativeDirection::FrontLeftAbove,
        RelativeDirection::FrontLeftBelow,
        RelativeDirection::BehindRightAbove,
        RelativeDirection::BehindRightBelow,
        RelativeDirection::BehindLeftAbove,
        RelativeDirection::BehindLeftBelow,
    ];

    fn compound(front: bool, right: bool, above: bool) -> Self {
        match (front, right, above) {
            (true, true, true) => RelativeDirection::FrontRightAbove,
            (true, true, false) => RelativeDirection::FrontRightBelow,
            (true, false, true) => RelativeDirection::FrontLeftAbove,
            (true, false, false) => RelativeDirection::FrontLeftBelow,
            (false, true, true) => RelativeDirection::BehindRightAbove,
            (false, true, false) => RelativeDirection::BehindRightBelow,
            (false, false, true) => RelativeDirection::BehindLeftAbove,
            (false, false, false) => RelativeDirection::BehindLeftBelow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelativeDirection::DirectlyAbove => "directly above",
            RelativeDirection::DirectlyBelow => "directly below",
            RelativeDirection::DirectlyRight => "directly to the right",
            RelativeDirection::DirectlyLeft => "directly to the left",
            RelativeDirection::DirectlyInFront => "directly in front",
            RelativeDirection::DirectlyBehind => "directly behind",
            RelativeDirection::FrontRightAbove => "front-right-above",
            RelativeDirection::FrontRightBelow => "front-right-below",
            RelativeDirection::FrontLeftAbove => "front-left-above",
            RelativeDirection::FrontLeftBelow => "front-left-below",
            RelativeDirection::BehindRightAbove => "behind-right-above",
            RelativeDirection::BehindRightBelow => "behind-right-below",
            RelativeDirection::BehindLeftAbove => "behind-left-above",
            RelativeDirection::BehindLeftBelow => "behind-left-below",
        }
    }

    /// Label as it reads inside "Actor is … the player."
    fn phrase(&self) -> String {
        match self {
            RelativeDirection::DirectlyRight
            | RelativeDirection::DirectlyLeft
            | RelativeDirection::DirectlyInFront => format!("{} of", self.label()),
            RelativeDirection::FrontRightAbove
            | RelativeDirection::FrontRightBelow
            | RelativeDirection::FrontLeftAbove
            | RelativeDirection::FrontLeftBelow => format!("in {}", self.label()),
            _ => self.label().to_string(),
        }
    }
}

/// Legacy labels of the two-axis classifier, which ignores verticality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanarDirection {
    FrontRight,
    FrontLeft,
    BehindRight,
    BehindLeft,
}

impl PlanarDirection {
    pub fn label(&self) -> &'static str {
        match self {
            PlanarDirection::FrontRight => "front-right",
            PlanarDirection::FrontLeft => "front-left",
            PlanarDirection::BehindRight => "behind-right",
            PlanarDirection::BehindLeft => "behind-left",
        }
    }

    fn phrase(&self) -> String {
        match self {
            PlanarDirection::FrontRight | PlanarDirection::FrontLeft => format!("in {} of", self.label()),
            _ => format!("{} of", self.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelativePosition {
    Spatial(RelativeDirection),
    Planar(PlanarDirection),
}

impl RelativePosition {
    pub fn label(&self) -> &'static str {
        match self {
            RelativePosition::Spatial(d) => d.label(),
            RelativePosition::Planar(d) => d.label(),
        }
    }

    /// Full sentence handed to the LLM, e.g. "Actor is in front-right-above the player."
    pub fn sentence(&self) -> String {
        let phrase = match self {
            RelativePosition::Spatial(d) => d.phrase(),
            RelativePosition::Planar(d) => d.phrase(),
        };
        format!("Actor is {} the player.", phrase)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    #[default]
    ThreeAxis,
    TwoAxis,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePositionClassifier {
    pub mode: ClassifierMode,
    pub vertical_threshold: f64,
    pub horizontal_threshold: f64,
}

impl Default for RelativePositionClassifier {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::ThreeAxis,
            vertical_threshold: VERTICAL_THRESHOLD,
            horizontal_threshold: HORIZONTAL_THRESHOLD,
        }
    }
}

impl RelativePositionClassifier {
    pub fn new(mode: ClassifierMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn classify(&self, dots: AxisProjections) -> RelativePosition {
        match self.mode {
            ClassifierMode::ThreeAxis => RelativePosition::Spatial(self.classify_spatial(dots)),
            ClassifierMode::TwoAxis => RelativePosition::Planar(Self::classify_planar(dots)),
        }
    }

    /// Strict comparisons throughout: a projection exactly at a threshold is
    /// not "directly" anything, and a projection of exactly zero counts as
    /// behind / left / below.
    pub fn classify_spatial(&self, dots: AxisProjections) -> RelativeDirection {
        let v = self.vertical_threshold;
        let h = self.horizontal_threshold;

        if dots.vertical > v {
            RelativeDirection::DirectlyAbove
        } else if dots.vertical < -v {
            RelativeDirection::DirectlyBelow
        } else if dots.right > h {
            RelativeDirection::DirectlyRight
        } else if dots.right < -h {
            RelativeDirection::DirectlyLeft
        } else if dots.forward > h {
            RelativeDirection::DirectlyInFront
        } else if dots.forward < -h {
            RelativeDirection::DirectlyBehind
        } else {
            RelativeDirection::compound(dots.forward > 0.0, dots.right > 0.0, dots.vertical > 0.0)
        }
    }

    pub fn classify_planar(dots: AxisProjections) -> PlanarDirection {
        match (dots.forward > 0.0, dots.right > 0.0) {
            (true, true) => PlanarDirection::FrontRight,
            (true, false) => PlanarDirection::FrontLeft,
            (false, true) => PlanarDirection::BehindRight,
            (false, false) => PlanarDirection::BehindLeft,
        }
    }
}
