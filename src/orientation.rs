//! Quaternion to Euler angle conversion.
//!
//! Angles follow the aerospace roll-pitch-yaw sequence and are returned in
//! degrees. Pitch is clamped to ±90° once the arcsine argument reaches the
//! edge of its domain (gimbal lock).

use std::f64::consts::PI;

use glam::DQuat;

/// Orientation as a quaternion. Expected to be unit length; the converter
/// does not renormalize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Returns `None` for the zero quaternion.
    pub fn normalize(&self) -> Option<Self> {
        let m = self.magnitude();
        if m == 0.0 || !m.is_finite() {
            return None;
        }
        Some(Self::new(self.x / m, self.y / m, self.z / m, self.w / m))
    }
}

impl From<DQuat> for Quaternion {
    fn from(q: DQuat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Roll, pitch and yaw in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl From<Quaternion> for EulerAngles {
    fn from(q: Quaternion) -> Self {
        quaternion_to_euler(q)
    }
}

/// Converts a unit quaternion into roll/pitch/yaw degrees.
///
/// The zero quaternion is not a rotation and is not guarded against: roll and
/// yaw come out as `atan2` of zeros and carry no meaning.
pub fn quaternion_to_euler(q: Quaternion) -> EulerAngles {
    let Quaternion { x, y, z, w } = q;

    let sinr_cosp = 2.0 * (w * x + y * z);
    let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
    let roll = sinr_cosp.atan2(cosr_cosp) * 180.0 / PI;

    let sinp = 2.0 * (w * y - z * x);
    let pitch = if sinp.abs() >= 1.0 {
        sinp.signum() * 90.0
    } else {
        sinp.asin() * 180.0 / PI
    };

    let siny_cosp = 2.0 * (w * z + x * y);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    let yaw = siny_cosp.atan2(cosy_cosp) * 180.0 / PI;

    EulerAngles { roll, pitch, yaw }
}

/// Maps any finite yaw onto a compass heading in `[0, 360)`.
pub fn normalize_heading(yaw: f64) -> f64 {
    let heading = ((yaw % 360.0) + 360.0) % 360.0;
    // -1e-17 + 360 rounds to exactly 360.0
    if heading >= 360.0 {
        0.0
    } else {
        heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn identity_is_level() {
        let e = quaternion_to_euler(Quaternion::IDENTITY);
        assert_eq!(e, EulerAngles { roll: 0.0, pitch: 0.0, yaw: 0.0 });
    }

    #[test]
    fn single_axis_rotations() {
        let roll = quaternion_to_euler(DQuat::from_rotation_x(30f64.to_radians()).into());
        assert!((roll.roll - 30.0).abs() < EPS);
        assert!(roll.pitch.abs() < EPS && roll.yaw.abs() < EPS);

        let pitch = quaternion_to_euler(DQuat::from_rotation_y((-45f64).to_radians()).into());
        assert!((pitch.pitch + 45.0).abs() < EPS);

        let yaw = quaternion_to_euler(DQuat::from_rotation_z(120f64.to_radians()).into());
        assert!((yaw.yaw - 120.0).abs() < EPS);
    }

    #[test]
    fn composed_rotation_recovers_each_angle() {
        let q = DQuat::from_rotation_z(40f64.to_radians())
            * DQuat::from_rotation_y(15f64.to_radians())
            * DQuat::from_rotation_x((-20f64).to_radians());
        let e = EulerAngles::from(Quaternion::from(q));
        assert!((e.roll + 20.0).abs() < 1e-6);
        assert!((e.pitch - 15.0).abs() < 1e-6);
        assert!((e.yaw - 40.0).abs() < 1e-6);
    }

    #[test]
    fn pitch_clamps_at_gimbal_lock() {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        // sinp = 2 * h * h, which rounds to exactly 1.0 or just above
        let up = quaternion_to_euler(Quaternion::new(0.0, h, 0.0, h));
        assert_eq!(up.pitch, 90.0);

        let down = quaternion_to_euler(Quaternion::new(0.0, -h, 0.0, h));
        assert_eq!(down.pitch, -90.0);

        // Non-unit input pushes sinp past 1 without producing NaN.
        let over = quaternion_to_euler(Quaternion::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(over.pitch, 90.0);
        assert!(!over.roll.is_nan() && !over.yaw.is_nan());
    }

    #[test]
    fn zero_sinp_is_not_clamped() {
        let e = quaternion_to_euler(Quaternion::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(e.pitch, 0.0);
    }

    #[test]
    fn heading_normalization() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(normalize_heading(370.0), 10.0);
        assert_eq!(normalize_heading(-720.0), 0.0);
        assert!((normalize_heading(179.5) - 179.5).abs() < EPS);
    }

    #[test]
    fn normalize_rejects_zero() {
        assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize().is_none());
        let q = Quaternion::new(0.0, 0.0, 0.0, 2.0).normalize().unwrap();
        assert_eq!(q, Quaternion::IDENTITY);
    }
}
