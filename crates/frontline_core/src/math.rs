//! Fixed-point math utilities for deterministic simulation.
//!
//! Positions, speeds, ranges and supply all use fixed-point arithmetic so a
//! seeded match replays bit-for-bit on any CPU.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Build a fixed-point value from a percentage (`percent(50)` is one half).
#[must_use]
pub fn percent(value: u32) -> Fixed {
    Fixed::from_num(value) / Fixed::from_num(100)
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vec2Fixed {
    /// X coordinate (along the lane).
    pub x: Fixed,
    /// Y coordinate (across the lane).
    pub y: Fixed,
}

/// Serde support for fixed-point numbers in hand-edited data files.
///
/// Values are written as plain decimals (`speed: 0.6`) and converted on load.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("expected a finite number"));
        }
        Ok(Fixed::saturating_from_num(value))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole-number coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`Fixed::MAX`] for points far apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// True when `other` lies within `radius` (inclusive).
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) <= radius.saturating_mul(radius)
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        let squared = self.dot(self);
        if squared < Fixed::MAX {
            return fixed_sqrt(squared);
        }
        // Shrink before squaring so long vectors keep a usable length.
        let scale = Fixed::from_num(256);
        let shrunk = Self::new(self.x / scale, self.y / scale);
        fixed_sqrt(shrunk.dot(shrunk)).saturating_mul(scale)
    }

    /// Dot product of two vectors, saturating on overflow.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Clamp into the rectangle `[0, width] x [0, height]`.
    #[must_use]
    pub fn clamped(self, width: Fixed, height: Fixed) -> Self {
        Self::new(
            self.x.clamp(Fixed::ZERO, width),
            self.y.clamp(Fixed::ZERO, height),
        )
    }

    /// Linearly interpolate between two vectors.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Advance toward `target` by at most `step`.
    ///
    /// Returns the new point and whether it reached the target.
    #[must_use]
    pub fn step_towards(self, target: Self, step: Fixed) -> (Self, bool) {
        let delta = target - self;
        let dist = delta.length();
        if dist <= step || dist == Fixed::ZERO {
            return (target, true);
        }
        let moved = Self::new(
            self.x + delta.x / dist * step,
            self.y + delta.y / dist * step,
        );
        (moved, false)
    }
}

/// Computes the square root of a fixed-point number using binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..48 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_of_pythagorean_triple() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
        let dist = a.distance(b);
        assert!((dist - Fixed::from_num(5)).abs() < Fixed::from_num(0.001));
    }

    #[test]
    fn test_step_towards_stops_at_target() {
        let start = Vec2Fixed::from_ints(0, 0);
        let target = Vec2Fixed::from_ints(10, 0);

        let (pos, arrived) = start.step_towards(target, Fixed::from_num(4));
        assert!(!arrived);
        assert!((pos.x - Fixed::from_num(4)).abs() < Fixed::from_num(0.001));

        let (pos, arrived) = pos.step_towards(target, Fixed::from_num(100));
        assert!(arrived);
        assert_eq!(pos, target);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Vec2Fixed::ZERO;
        let b = Vec2Fixed::from_ints(10, 20);
        assert_eq!(a.lerp(b, Fixed::from_num(0.5)), Vec2Fixed::from_ints(5, 10));
    }

    #[test]
    fn test_within_is_inclusive() {
        let a = Vec2Fixed::ZERO;
        let b = Vec2Fixed::from_ints(0, 100);
        assert!(a.within(b, Fixed::from_num(100)));
        assert!(!a.within(b, Fixed::from_num(99)));
    }

    #[test]
    fn test_far_points_saturate_instead_of_overflowing() {
        let a = Vec2Fixed::ZERO;
        let b = Vec2Fixed::from_ints(100_000, 200);
        assert_eq!(a.distance_squared(b), Fixed::MAX);
        assert_eq!(b.dot(b), Fixed::MAX);
        assert!((b.length() - Fixed::from_num(100_000)).abs() < Fixed::from_num(1));

        let (pos, arrived) = a.step_towards(b, Fixed::from_num(2));
        assert!(!arrived);
        assert!((pos.x - Fixed::from_num(2)).abs() < Fixed::from_num(0.01));
    }

    #[test]
    fn test_clamped_to_rectangle() {
        let p = Vec2Fixed::from_ints(100_000, -50).clamped(Fixed::from_num(3200), Fixed::from_num(400));
        assert_eq!(p, Vec2Fixed::from_ints(3200, 0));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(50), Fixed::from_num(0.5));
        assert_eq!(percent(150), Fixed::from_num(1.5));
    }
}
