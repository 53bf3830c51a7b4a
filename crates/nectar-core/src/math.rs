/// Minimal 3-D math for the foraging simulation: vectors, quaternions and
/// the angle helpers the agent's rotation pipeline needs.
///
/// Conventions: right-handed, Y up, Z forward. Pitch rotates about X
/// (positive pitch tips the forward axis downward), yaw rotates about Y,
/// roll is always zero.
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a degenerate input.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec3::ZERO
        } else {
            self * (1.0 / len)
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Unit quaternion stored as (x, y, z, w).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn from_axis_angle(axis: Vec3, angle_rad: f32) -> Quat {
        let half = angle_rad * 0.5;
        let (s, c) = half.sin_cos();
        let a = axis.normalized();
        Quat {
            x: a.x * s,
            y: a.y * s,
            z: a.z * s,
            w: c,
        }
    }

    /// Build the agent's roll-free orientation: pitch about X applied first,
    /// then yaw about Y.
    pub fn from_pitch_yaw_deg(pitch_deg: f32, yaw_deg: f32) -> Quat {
        let yaw = Quat::from_axis_angle(Vec3::UP, yaw_deg.to_radians());
        let pitch = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), pitch_deg.to_radians());
        yaw * pitch
    }

    pub fn normalized(self) -> Quat {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len <= f32::EPSILON {
            Quat::IDENTITY
        } else {
            let inv = 1.0 / len;
            Quat {
                x: self.x * inv,
                y: self.y * inv,
                z: self.z * inv,
                w: self.w * inv,
            }
        }
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(v) * 2.0;
        v + t * self.w + qv.cross(t)
    }
}

impl Mul for Quat {
    type Output = Quat;
    fn mul(self, rhs: Quat) -> Quat {
        Quat {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

/// Step `current` toward `target` by at most `max_delta`, never overshooting.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Decompose a look direction into roll-free (pitch, yaw) degrees such that
/// `Quat::from_pitch_yaw_deg(pitch, yaw)` rotates `Vec3::FORWARD` onto the
/// direction. Positive pitch looks downward.
pub fn direction_to_pitch_yaw(dir: Vec3) -> (f32, f32) {
    let d = dir.normalized();
    if d == Vec3::ZERO {
        return (0.0, 0.0);
    }
    let pitch = (-d.y).clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = d.x.atan2(d.z).to_degrees();
    (pitch, yaw)
}

/// Map an angle in degrees into the (-180, 180] range.
pub fn wrap_angle_deg(angle: f32) -> f32 {
    let mut a = angle.rem_euclid(360.0);
    if a > 180.0 {
        a -= 360.0;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-5
    }

    #[test]
    fn normalized_handles_zero_vector() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        let unit = Vec3::new(3.0, 0.0, 4.0).normalized();
        assert!((unit.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn yaw_rotates_forward_in_horizontal_plane() {
        let q = Quat::from_pitch_yaw_deg(0.0, 90.0);
        let f = q.rotate(Vec3::FORWARD);
        assert!(approx_vec(f, Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn positive_pitch_looks_downward() {
        let q = Quat::from_pitch_yaw_deg(90.0, 0.0);
        let f = q.rotate(Vec3::FORWARD);
        assert!(approx_vec(f, Vec3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn pitch_yaw_round_trips_through_direction() {
        for &(pitch, yaw) in &[(0.0f32, 0.0f32), (35.0, -120.0), (-60.0, 45.0), (79.0, 179.0)] {
            let dir = Quat::from_pitch_yaw_deg(pitch, yaw).rotate(Vec3::FORWARD);
            let (p, y) = direction_to_pitch_yaw(dir);
            assert!((p - pitch).abs() < 1e-3, "pitch {pitch} -> {p}");
            assert!((y - yaw).abs() < 1e-3, "yaw {yaw} -> {y}");
        }
    }

    #[test]
    fn rotation_preserves_length() {
        let q = Quat::from_pitch_yaw_deg(33.0, -74.0);
        let v = Vec3::new(1.5, -2.0, 0.25);
        assert!((q.rotate(v).length() - v.length()).abs() < 1e-5);
    }

    #[test]
    fn move_towards_clamps_step_and_reaches_target() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_towards(0.0, -1.0, 0.25), -0.25);
    }

    #[test]
    fn wrap_angle_maps_into_half_open_range() {
        assert!((wrap_angle_deg(270.0) - (-90.0)).abs() < 1e-6);
        assert!((wrap_angle_deg(-270.0) - 90.0).abs() < 1e-6);
        assert!((wrap_angle_deg(180.0) - 180.0).abs() < 1e-6);
    }
}
