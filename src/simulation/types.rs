//! Core types for the crowd simulation
//!
//! These are standalone types shared by the parser, lifecycle and camera code.

use std::ops::{Add, Mul, Sub};

/// Handle of an agent inside the crowd engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(pub usize);

/// Ground-truth track identifier, assigned sequentially at spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub usize);

/// A 2D point or direction in world (or camera-local) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(&self, other: &Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Squared length
    pub fn abs_sq(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.abs_sq().sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero
    pub fn normalize(&self) -> Vector2 {
        let len = self.length();
        if len > 0.0 {
            Vector2::new(self.x / len, self.y / len)
        } else {
            Vector2::ZERO
        }
    }

    pub fn lerp(&self, other: &Vector2, t: f64) -> Vector2 {
        Vector2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Rotate counter-clockwise about the origin
    pub fn rotate(&self, radians: f64) -> Vector2 {
        let (sin, cos) = radians.sin_cos();
        Vector2 {
            x: cos * self.x - sin * self.y,
            y: sin * self.x + cos * self.y,
        }
    }

    /// Left-hand perpendicular, (-y, x)
    pub fn perp(&self) -> Vector2 {
        Vector2::new(-self.y, self.x)
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<Vector2> for f64 {
    type Output = Vector2;

    fn mul(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self * rhs.x, self * rhs.y)
    }
}
