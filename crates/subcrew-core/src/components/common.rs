//! Common math and position components shared across entity types.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// 2D vector - vessel interiors are simulated on a vertical cross-section
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Linear interpolation between `a` and `b` by `t` in [0, 1]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Spatial position component - where an entity is located
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    /// World-space position in meters
    pub pos: Vec2,
    /// The hull (compartment) this entity is currently inside, if any.
    /// `None` means the entity is outside the vessel.
    #[serde(skip)]
    pub hull: Option<Entity>,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            hull: None,
        }
    }
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            hull: None,
        }
    }

    pub fn in_hull(mut self, hull: Entity) -> Self {
        self.hull = Some(hull);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 8.0);

        let diff = b - a;
        assert_eq!(diff.x, 3.0);
        assert_eq!(diff.y, 4.0);

        let scaled = a * 2.0;
        assert_eq!(scaled.x, 2.0);
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2::new(3.0, 4.0);
        let n = v.normalize();
        assert!((n.length() - 1.0).abs() < 0.001);
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.25, 1.0, 0.0), 0.25);
        assert_eq!(lerp(0.25, 1.0, 1.0), 1.0);
        assert!((lerp(1.0, 0.25, 0.5) - 0.625).abs() < 0.001);
    }
}
