use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Added to the magnitude before dividing in `normalize`, so a zero vector stays finite.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// A simple 2D vector struct.
///
/// Operators and the `*ed` / `scale` / `component_div` methods return new values.
/// `normalize`, `rotate`, `look_at`, `set`, `reset` and `copy_from` mutate in place and
/// return `&mut Self` so calls can be chained.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2.
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Creates a zero vector.
    pub const fn zero() -> Self {
        Vec2 { x: 0.0, y: 0.0 }
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    /// Four-quadrant heading of the vector, in radians.
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Scales the vector by a scalar value.
    pub fn scale(&self, scalar: f32) -> Self {
        Vec2 { x: self.x * scalar, y: self.y * scalar }
    }

    /// Component-wise division.
    pub fn component_div(&self, other: Vec2) -> Self {
        Vec2 { x: self.x / other.x, y: self.y / other.y }
    }

    pub fn normalized(&self) -> Self {
        let mut v = *self;
        v.normalize();
        v
    }

    pub fn rotated(&self, theta: f32) -> Self {
        let mut v = *self;
        v.rotate(theta);
        v
    }

    pub fn set(&mut self, x: f32, y: f32) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn reset(&mut self) -> &mut Self {
        self.set(0.0, 0.0)
    }

    pub fn copy_from(&mut self, other: Vec2) -> &mut Self {
        self.set(other.x, other.y)
    }

    /// Divides by `magnitude + NORMALIZE_EPSILON`. The zero vector is left at zero.
    pub fn normalize(&mut self) -> &mut Self {
        let mag = self.magnitude() + NORMALIZE_EPSILON;
        self.x /= mag;
        self.y /= mag;
        self
    }

    /// Rotates counter-clockwise by `theta` radians.
    pub fn rotate(&mut self, theta: f32) -> &mut Self {
        let (s, c) = theta.sin_cos();
        let x = self.x * c - self.y * s;
        let y = self.x * s + self.y * c;
        self.x = x;
        self.y = y;
        self
    }

    /// Turns the vector to point from itself toward `target`, keeping its magnitude.
    pub fn look_at(&mut self, target: Vec2) -> &mut Self {
        let mag = self.magnitude();
        let theta = (target.y - self.y).atan2(target.x - self.x);
        let current = self.angle();
        self.rotate(theta - current);
        self.normalize();
        *self *= mag;
        self
    }
}

// Implement standard operators for convenience
impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self { x: self.x * scalar, y: self.y * scalar }
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        Self { x: self.x / scalar, y: self.y / scalar }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, scalar: f32) {
        self.x *= scalar;
        self.y *= scalar;
    }
}
