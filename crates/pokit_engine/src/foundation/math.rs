//! Math utilities and types
//!
//! Provides the 2D vector used for every transform in the engine, plus the
//! axis-aligned volumes the collision pipeline works with. Rotations are
//! expressed in degrees at the API surface and delegated to nalgebra.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use approx::{AbsDiffEq, RelativeEq};
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

/// 2D vector with `f64` components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    /// Horizontal component
    #[serde(default)]
    pub x: f64,
    /// Vertical component (positive is down / south)
    #[serde(default)]
    pub y: f64,
}

impl Vector {
    /// The zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// The unit-scale vector
    pub const ONE: Self = Self::new(1.0, 1.0);

    /// Create a vector from components
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a vector with both components set to `value`
    pub const fn splat(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Component-wise multiplication
    pub fn mul_elem(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    /// Component-wise division
    pub fn div_elem(self, other: Self) -> Self {
        Self::new(self.x / other.x, self.y / other.y)
    }

    /// Rotate around the origin by `degrees`
    pub fn rotate(self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return self;
        }
        let rotated = Rotation2::new(deg_to_rad(degrees)) * Vector2::from(self);
        rotated.into()
    }

    /// Component-wise sign; zero stays zero
    pub fn signum(self) -> Self {
        Self::new(sign(self.x), sign(self.y))
    }

    /// Component-wise absolute value
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Clamp each component into `[min, max]`
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(clamp(self.x, min.x, max.x), clamp(self.y, min.y, max.y))
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Euclidean length
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// True when both components are exactly zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl From<Vector> for Vector2<f64> {
    fn from(v: Vector) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vector2<f64>> for Vector {
    fn from(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }
}

impl Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vector {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl AbsDiffEq for Vector {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon) && self.y.abs_diff_eq(&other.y, epsilon)
    }
}

impl RelativeEq for Vector {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
    }
}

/// Compass directions in screen space (y grows downwards)
pub mod compass {
    use super::Vector;

    /// Up
    pub const NORTH: Vector = Vector::new(0.0, -1.0);
    /// Right
    pub const EAST: Vector = Vector::new(1.0, 0.0);
    /// Down
    pub const SOUTH: Vector = Vector::new(0.0, 1.0);
    /// Left
    pub const WEST: Vector = Vector::new(-1.0, 0.0);
}

/// Point in the 3-axis collision space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Layer coordinate
    pub z: f64,
}

/// Axis-aligned bounding volume: a 2D box extruded along the layer axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3,
    /// Maximum corner
    pub max: Point3,
}

impl Aabb {
    /// Build from a center, a full-size extent and a layer span `z .. z + depth`
    pub fn from_center_size(center: Vector, size: Vector, z: f64, depth: f64) -> Self {
        let half = size / 2.0;
        Self {
            min: Point3 { x: center.x - half.x, y: center.y - half.y, z },
            max: Point3 { x: center.x + half.x, y: center.y + half.y, z: z + depth },
        }
    }

    /// Strict overlap test: touching faces do not collide
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x
            || self.min.x >= other.max.x
            || self.max.y <= other.min.y
            || self.min.y >= other.max.y
            || self.max.z <= other.min.z
            || self.min.z >= other.max.z)
    }

    /// Center in the XY plane
    pub fn center(&self) -> Vector {
        Vector::new((self.min.x + self.max.x) * 0.5, (self.min.y + self.max.y) * 0.5)
    }
}

/// Convert degrees to radians
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Convert radians to degrees
pub fn rad_to_deg(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Clamp a value between min and max
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Sign of `value`, with zero mapping to zero
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Move `value` toward zero by `step` without crossing it
pub fn bring_to_zero(value: f64, step: f64) -> f64 {
    let s = sign(value);
    let reduced = value - s * step;
    if sign(reduced) == s {
        reduced
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_rotate_quarter_turn() {
        let rotated = Vector::new(1.0, 0.0).rotate(90.0);
        assert_relative_eq!(rotated, Vector::new(0.0, 1.0), epsilon = EPSILON);

        let back = rotated.rotate(-90.0);
        assert_relative_eq!(back, Vector::new(1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_bring_to_zero_never_overshoots() {
        assert_eq!(bring_to_zero(5.0, 2.0), 3.0);
        assert_eq!(bring_to_zero(1.0, 2.0), 0.0);
        assert_eq!(bring_to_zero(-1.5, 1.0), -0.5);
        assert_eq!(bring_to_zero(-0.5, 1.0), 0.0);
        assert_eq!(bring_to_zero(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_vector_clamp() {
        let v = Vector::new(50.0, -50.0).clamp(Vector::splat(-10.0), Vector::splat(10.0));
        assert_eq!(v, Vector::new(10.0, -10.0));
    }

    #[test]
    fn test_aabb_touching_is_not_overlap() {
        let a = Aabb::from_center_size(Vector::ZERO, Vector::splat(32.0), 0.0, 1.0);
        let b = Aabb::from_center_size(Vector::new(32.0, 0.0), Vector::splat(32.0), 0.0, 1.0);
        let c = Aabb::from_center_size(Vector::new(31.0, 0.0), Vector::splat(32.0), 0.0, 1.0);

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_aabb_separate_layers() {
        let a = Aabb::from_center_size(Vector::ZERO, Vector::splat(32.0), 0.0, 1.0);
        let b = Aabb::from_center_size(Vector::ZERO, Vector::splat(32.0), 1.0, 1.0);
        assert!(!a.overlaps(&b));
    }
}
