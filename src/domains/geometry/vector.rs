use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Immutable 3D point/vector in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or the zero vector when the
    /// magnitude is zero.
    pub fn normalize(&self) -> Vector3 {
        let mag = self.magnitude();
        if mag == 0.0 {
            return Vector3::ZERO;
        }
        *self / mag
    }

    /// Projection onto the ground plane.
    pub fn planar(&self) -> Vector3 {
        Vector3::new(self.x, self.y, 0.0)
    }

    pub fn planar_distance(&self, other: &Vector3) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn with_z(&self, z: f64) -> Vector3 {
        Vector3::new(self.x, self.y, z)
    }

    pub fn rotate_x(&self, pivot: &Vector3, angle: f64) -> Vector3 {
        let t = *self - *pivot;
        let (sin, cos) = angle.sin_cos();
        Vector3::new(t.x, t.y * cos - t.z * sin, t.y * sin + t.z * cos) + *pivot
    }

    pub fn rotate_y(&self, pivot: &Vector3, angle: f64) -> Vector3 {
        let t = *self - *pivot;
        let (sin, cos) = angle.sin_cos();
        Vector3::new(t.x * cos + t.z * sin, t.y, -t.x * sin + t.z * cos) + *pivot
    }

    /// Rotation by `angle` radians about the z axis through `pivot`.
    pub fn rotate_z(&self, pivot: &Vector3, angle: f64) -> Vector3 {
        let t = *self - *pivot;
        let (sin, cos) = angle.sin_cos();
        Vector3::new(t.x * cos - t.y * sin, t.x * sin + t.y * cos, t.z) + *pivot
    }

    /// Unit vector on the ground plane pointing along `degrees` about z.
    pub fn heading(degrees: f64) -> Vector3 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Vector3::new(cos, sin, 0.0)
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Vector3) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vector3 {
    fn sub_assign(&mut self, rhs: Vector3) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    fn mul(self, scalar: f64) -> Vector3 {
        Vector3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;
    fn div(self, scalar: f64) -> Vector3 {
        Vector3::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        self * -1.0
    }
}

/// Wraps an angle in radians into (-PI, PI].
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    let mut wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped -= TAU;
    }
    wrapped
}

/// Wraps an angle in degrees into [0, 360).
pub fn wrap_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    angle.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vector3::ZERO.normalize(), Vector3::ZERO);
    }

    #[test]
    fn rotate_z_about_pivot() {
        let p = Vector3::new(2.0, 1.0, 0.5);
        let r = p.rotate_z(&Vector3::new(1.0, 1.0, 0.0), FRAC_PI_2);
        assert!((r.x - 1.0).abs() < 1e-12);
        assert!((r.y - 2.0).abs() < 1e-12);
        assert_eq!(r.z, 0.5);
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(wrap_degrees(-90.0), 270.0);
    }
}
