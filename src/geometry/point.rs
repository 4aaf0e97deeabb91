use std::ops::{Add, Mul, Sub};

/// A point on a fragment boundary, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundaryPoint {
    pub x: f64,
    pub y: f64,
}

impl BoundaryPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    /// Z component of the 2D cross product
    pub fn cross(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Linear interpolation towards `other`, `t` in [0, 1]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Signed perpendicular distance to the infinite line through `start` and `end`.
    ///
    /// Positive values lie to the left of the direction `start -> end`.
    /// Returns the plain distance to `start` when the two line points coincide.
    pub fn signed_distance_to_line(&self, start: &Self, end: &Self) -> f64 {
        let direction = *end - *start;
        let length = direction.length();
        if length <= f64::EPSILON {
            return self.distance(start);
        }
        direction.cross(&(*self - *start)) / length
    }

    pub fn rotated(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }
}

impl Add for BoundaryPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for BoundaryPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for BoundaryPoint {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl From<(f64, f64)> for BoundaryPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_distance_sides() {
        let start = BoundaryPoint::new(0.0, 0.0);
        let end = BoundaryPoint::new(10.0, 0.0);

        assert_eq!(BoundaryPoint::new(3.0, 2.0).signed_distance_to_line(&start, &end), 2.0);
        assert_eq!(BoundaryPoint::new(3.0, -4.0).signed_distance_to_line(&start, &end), -4.0);
        // Swapping the line direction flips the sign
        assert_eq!(BoundaryPoint::new(3.0, 2.0).signed_distance_to_line(&end, &start), -2.0);
    }

    #[test]
    fn lerp_endpoints() {
        let a = BoundaryPoint::new(1.0, 1.0);
        let b = BoundaryPoint::new(3.0, 5.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), BoundaryPoint::new(2.0, 3.0));
    }
}
