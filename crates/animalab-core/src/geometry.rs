//! Geometric primitives for graph node placement.
//!
//! Node positions follow the host editor convention: origin at the top-left,
//! X increasing rightward and Y increasing downward, measured in pixels.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2D vector used both as a position and as a force.
///
/// # Examples
///
/// ```
/// # use animalab_core::geometry::Vec2;
/// let a = Vec2::new(3.0, 4.0);
/// assert_eq!(a.length(), 5.0);
///
/// let mid = a.midpoint(Vec2::ZERO);
/// assert_eq!(mid, Vec2::new(1.5, 2.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    x: f32,
    y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Creates a new vector with the specified components
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x component
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y component
    pub fn y(self) -> f32 {
        self.y
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Returns the unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Self {
        let length = self.length();
        if length > 0.0 {
            self * (1.0 / length)
        } else {
            Self::ZERO
        }
    }

    /// Shortens the vector to `max` when it is longer than that.
    pub fn clamp_length(self, max: f32) -> Self {
        let length = self.length();
        if length > max && length > 0.0 {
            self * (max / length)
        } else {
            self
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Vec2) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Rounds both components to the nearest integer.
    pub fn round(self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Vec2) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, other: Vec2) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, factor: f32) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// An axis-aligned box spanning a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min: Vec2,
    max: Vec2,
}

impl Bounds {
    /// Builds the smallest box containing every point, or `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in points {
            bounds.min = Vec2::new(bounds.min.x.min(point.x), bounds.min.y.min(point.y));
            bounds.max = Vec2::new(bounds.max.x.max(point.x), bounds.max.y.max(point.y));
        }
        Some(bounds)
    }

    pub fn min(self) -> Vec2 {
        self.min
    }

    pub fn max(self) -> Vec2 {
        self.max
    }

    /// Length of the box diagonal.
    pub fn diagonal(self) -> f32 {
        (self.max - self.min).length()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_vec2_arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);
        assert_eq!(a + b, Vec2::new(4.0, 1.0));
        assert_eq!(a - b, Vec2::new(-2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(-a, Vec2::new(-1.0, -2.0));

        let mut c = a;
        c += b;
        c -= a;
        assert_eq!(c, b);
    }

    #[test]
    fn test_normalized_zero_vector() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let unit = Vec2::new(0.0, 5.0).normalized();
        assert!(approx_eq!(f32, unit.y(), 1.0));
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2::new(30.0, 40.0).clamp_length(5.0);
        assert!(approx_eq!(f32, v.x(), 3.0, epsilon = 1e-5));
        assert!(approx_eq!(f32, v.y(), 4.0, epsilon = 1e-5));

        let short = Vec2::new(1.0, 1.0);
        assert_eq!(short.clamp_length(5.0), short);
    }

    #[test]
    fn test_bounds_from_points() {
        assert!(Bounds::from_points(Vec::new()).is_none());

        let bounds = Bounds::from_points([
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, -4.0),
            Vec2::new(-1.0, 2.0),
        ])
        .unwrap();
        assert_eq!(bounds.min(), Vec2::new(-1.0, -4.0));
        assert_eq!(bounds.max(), Vec2::new(3.0, 2.0));
        assert!(approx_eq!(f32, bounds.diagonal(), 52.0f32.sqrt()));
    }
}
