use glam::DVec3;

use crate::orientation::{normalize_heading, EulerAngles};

/// One immutable set of telemetry values.
///
/// Angles are in degrees, altitude in meters, speeds in m/s. Vectors carry
/// acceleration (m/s²), angular velocity (deg/s) and magnetic field (µT).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySnapshot {
    pub roll: f64,
    pub pitch: f64,
    /// Always within `[0, 360)` when built through the `with_*` helpers.
    pub heading: f64,
    pub altitude: f64,
    pub airspeed: f64,
    pub vertical_speed: f64,
    pub acceleration: DVec3,
    pub angular_velocity: DVec3,
    pub magnetic_field: DVec3,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TelemetrySnapshot {
    /// Copy of `self` with attitude taken from `euler`; yaw becomes heading.
    pub fn with_orientation(self, euler: EulerAngles) -> Self {
        Self {
            roll: euler.roll,
            pitch: euler.pitch,
            heading: normalize_heading(euler.yaw),
            ..self
        }
    }

    pub fn with_heading(self, heading: f64) -> Self {
        Self {
            heading: normalize_heading(heading),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_normalizes_yaw() {
        let snapshot = TelemetrySnapshot::default().with_orientation(EulerAngles {
            roll: 5.0,
            pitch: -3.0,
            yaw: -45.0,
        });
        assert_eq!(snapshot.roll, 5.0);
        assert_eq!(snapshot.pitch, -3.0);
        assert_eq!(snapshot.heading, 315.0);
    }

    #[test]
    fn other_fields_survive() {
        let base = TelemetrySnapshot {
            altitude: 120.0,
            latitude: Some(47.5),
            ..Default::default()
        };
        let next = base.with_heading(400.0);
        assert_eq!(next.heading, 40.0);
        assert_eq!(next.altitude, 120.0);
        assert_eq!(next.latitude, Some(47.5));
        // the original is untouched
        assert_eq!(base.heading, 0.0);
    }
}
