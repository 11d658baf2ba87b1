use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Lengths below this are treated as "no direction" by [`Vector3::normalize`].
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Tolerance used for "nearly equal" and "nearly zero" comparisons.
pub const KINDA_SMALL_NUMBER: f64 = 1e-4;

/// World-space vector. Serializes as a plain `{x, y, z}` record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 1.0 };
    pub const FORWARD: Vector3 = Vector3 { x: 1.0, y: 0.0, z: 0.0 };
    pub const RIGHT: Vector3 = Vector3 { x: 0.0, y: 1.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(&self, other: &Vector3) -> f64 {
        (*other - *self).length()
    }

    /// Unit vector in the same direction, or [`Vector3::ZERO`] when the
    /// length is below [`NORMALIZE_EPSILON`].
    pub fn normalize(&self) -> Vector3 {
        let len = self.length();
        if !len.is_finite() || len < NORMALIZE_EPSILON {
            return Vector3::ZERO;
        }
        Vector3::new(self.x / len, self.y / len, self.z / len)
    }

    /// Per-component comparison within `tolerance`.
    pub fn abs_diff_eq(&self, other: &Vector3, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }

    pub fn is_nearly_zero(&self, tolerance: f64) -> bool {
        self.abs_diff_eq(&Vector3::ZERO, tolerance)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn component_min(&self, other: &Vector3) -> Vector3 {
        Vector3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn component_max(&self, other: &Vector3) -> Vector3 {
        Vector3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn max_component(&self) -> f64 {
        self.x.max(self.y).max(self.z)
    }

    /// Structured `{x, y, z}` record for handing to JSON collaborators.
    pub fn serialize(&self) -> serde_json::Value {
        serde_json::json!({ "x": self.x, "y": self.y, "z": self.z })
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}
