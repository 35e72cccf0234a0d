//! Gauge geometry: maps telemetry values to drawing primitives.
//!
//! Every gauge is drawn inside a `size x size` square with its face centered
//! and a face radius of `0.45 * size`. Gauge angles are degrees clockwise from
//! 12 o'clock.

use bon::Builder;
use glam::{DVec2, DVec3};
use tracing::debug;

use crate::config::{Color, ColorMode, Palette};
use crate::orientation::normalize_heading;
use crate::render::{DrawCommand, Scene};
use crate::telemetry::TelemetrySnapshot;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct GaugeStyle {
    #[builder(default = 200)]
    pub size: u32,
    #[builder(default)]
    pub color_mode: ColorMode,
    #[builder(default = DEFAULT_MAX_ALTITUDE)]
    pub max_altitude: f64,
    #[builder(default = DEFAULT_MAX_AIRSPEED)]
    pub max_airspeed: f64,
    #[builder(default = DEFAULT_MAX_VERTICAL_SPEED)]
    pub max_vertical_speed: f64,
    /// Pixels per m/s² on the IMU display
    #[builder(default = 5.0)]
    pub imu_scale: f64,
    #[builder(default = 5)]
    pub minor_ticks_per_interval: usize,
    /// Adds NE/SE/SW/NW to the compass card
    #[builder(default = false)]
    pub compass_ordinals: bool,
}

impl Default for GaugeStyle {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GaugeStyle {
    pub fn palette(&self) -> Palette {
        Palette::for_mode(self.color_mode)
    }

    fn altitude_range(&self) -> f64 {
        usable_range(self.max_altitude, DEFAULT_MAX_ALTITUDE)
    }

    fn airspeed_range(&self) -> f64 {
        usable_range(self.max_airspeed, DEFAULT_MAX_AIRSPEED)
    }

    fn vertical_speed_range(&self) -> f64 {
        usable_range(self.max_vertical_speed, DEFAULT_MAX_VERTICAL_SPEED)
    }

    fn frame(&self) -> Frame {
        let size = self.size as f64;
        Frame {
            center: DVec2::splat(size / 2.0),
            radius: face_radius(self.size),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeKind {
    Attitude,
    Compass,
    Altimeter,
    Airspeed,
    VerticalSpeed,
    Imu,
}

impl GaugeKind {
    pub const ALL: [GaugeKind; 6] = [
        GaugeKind::Attitude,
        GaugeKind::Compass,
        GaugeKind::Altimeter,
        GaugeKind::Airspeed,
        GaugeKind::VerticalSpeed,
        GaugeKind::Imu,
    ];

    pub fn title(self) -> &'static str {
        match self {
            GaugeKind::Attitude => "ATT",
            GaugeKind::Compass => "HDG",
            GaugeKind::Altimeter => "ALT m",
            GaugeKind::Airspeed => "IAS m/s",
            GaugeKind::VerticalSpeed => "VS m/s",
            GaugeKind::Imu => "IMU",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    center: DVec2,
    radius: f64,
    size: f64,
}

// ============================================================================
// GEOMETRY
// ============================================================================

pub const FACE_RATIO: f64 = 0.45;

pub const DEFAULT_MAX_ALTITUDE: f64 = 500.0;
pub const DEFAULT_MAX_AIRSPEED: f64 = 30.0;
pub const DEFAULT_MAX_VERTICAL_SPEED: f64 = 5.0;

/// Sky/ground rectangles extend this many radii from the horizon line, which
/// covers the face for any roll and any horizon offset up to one radius.
pub const HORIZON_EXTENT: f64 = 3.0;

/// Degrees of pitch that move the horizon by one face radius
pub const PITCH_DEGREES_PER_RADIUS: f64 = 90.0;

pub const AIRSPEED_START_DEG: f64 = -135.0;
pub const AIRSPEED_SWEEP_DEG: f64 = 270.0;

pub const VERTICAL_SPEED_ZERO_DEG: f64 = -90.0;
/// Deflection for a full-scale climb or descent
pub const VERTICAL_SPEED_HALF_SWEEP_DEG: f64 = 180.0;

/// IMU arrows never leave this fraction of the face
pub const IMU_VECTOR_LIMIT: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Red,
    Yellow,
    Green,
}

/// Airspeed bands as (start, end) fractions of the sweep
pub const AIRSPEED_ZONES: [(f64, f64, Zone); 5] = [
    (0.0, 0.1, Zone::Red),
    (0.1, 0.2, Zone::Yellow),
    (0.2, 0.8, Zone::Green),
    (0.8, 0.9, Zone::Yellow),
    (0.9, 1.0, Zone::Red),
];

/// An angular band of the airspeed arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneArc {
    pub start_deg: f64,
    pub sweep_deg: f64,
    pub zone: Zone,
}

pub fn face_radius(size: u32) -> f64 {
    size as f64 * FACE_RATIO
}

/// Replaces NaN and infinities with zero
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        debug!(value, "Non-finite telemetry value replaced with 0");
        0.0
    }
}

/// Magnitude of a gauge's full-scale value. Zero, NaN and infinite ranges
/// fall back to `fallback`.
pub fn usable_range(max: f64, fallback: f64) -> f64 {
    let max = max.abs();
    if max.is_finite() && max > 0.0 {
        max
    } else {
        debug!(max, fallback, "Unusable gauge range, using default");
        fallback
    }
}

/// Screen point at `radius` from `center` in gauge direction `deg`
pub fn polar(center: DVec2, radius: f64, deg: f64) -> DVec2 {
    let rad = deg.to_radians();
    center + DVec2::new(rad.sin(), -rad.cos()) * radius
}

/// Vertical shift of the horizon in pixels; positive pitch moves it down.
pub fn horizon_offset(pitch: f64, radius: f64) -> f64 {
    sanitize(pitch).clamp(-PITCH_DEGREES_PER_RADIUS, PITCH_DEGREES_PER_RADIUS)
        / PITCH_DEGREES_PER_RADIUS
        * radius
}

/// Screen rotation of the sky/ground split in radians, clockwise on screen
/// for positive roll.
pub fn horizon_rotation(roll: f64) -> f64 {
    sanitize(roll).to_radians()
}

/// Sky and ground quads after pitch offset and roll rotation, in that order
pub fn horizon_quads(center: DVec2, radius: f64, roll: f64, pitch: f64) -> [[DVec2; 4]; 2] {
    let offset = horizon_offset(pitch, radius);
    let extent = HORIZON_EXTENT * radius;
    let rotation = DVec2::from_angle(horizon_rotation(roll));
    let place = |x: f64, y: f64| center + rotation.rotate(DVec2::new(x, y));
    [
        [
            place(-extent, offset - extent),
            place(extent, offset - extent),
            place(extent, offset),
            place(-extent, offset),
        ],
        [
            place(-extent, offset),
            place(extent, offset),
            place(extent, offset + extent),
            place(-extent, offset + extent),
        ],
    ]
}

/// Rotation applied to the compass card, in degrees
pub fn dial_rotation(heading: f64) -> f64 {
    -normalize_heading(sanitize(heading))
}

/// One full revolution per `max_altitude`
pub fn altimeter_needle_angle(altitude: f64, max_altitude: f64) -> f64 {
    sanitize(altitude) / usable_range(max_altitude, DEFAULT_MAX_ALTITUDE) * 360.0
}

pub fn airspeed_needle_angle(airspeed: f64, max_airspeed: f64) -> f64 {
    let max = usable_range(max_airspeed, DEFAULT_MAX_AIRSPEED);
    let fraction = sanitize(airspeed).clamp(0.0, max) / max;
    AIRSPEED_START_DEG + fraction * AIRSPEED_SWEEP_DEG
}

pub fn airspeed_zones() -> [ZoneArc; 5] {
    AIRSPEED_ZONES.map(|(start, end, zone)| ZoneArc {
        start_deg: AIRSPEED_START_DEG + start * AIRSPEED_SWEEP_DEG,
        sweep_deg: (end - start) * AIRSPEED_SWEEP_DEG,
        zone,
    })
}

/// Zero at 9 o'clock; climbs deflect clockwise, descents counter-clockwise.
pub fn vertical_speed_needle_angle(vertical_speed: f64, max_vertical_speed: f64) -> f64 {
    let max = usable_range(max_vertical_speed, DEFAULT_MAX_VERTICAL_SPEED);
    let clamped = sanitize(vertical_speed).clamp(-max, max);
    VERTICAL_SPEED_ZERO_DEG + clamped / max * VERTICAL_SPEED_HALF_SWEEP_DEG
}

/// Screen offset of the acceleration arrow: X to the right, Y up, scaled and
/// limited to the visible part of the face. `None` for a zero vector.
pub fn imu_vector(acceleration: DVec3, scale: f64, radius: f64) -> Option<DVec2> {
    let planar = DVec2::new(sanitize(acceleration.x), -sanitize(acceleration.y)) * scale;
    let length = planar.length();
    if length == 0.0 || !length.is_finite() {
        return None;
    }
    let limit = radius * IMU_VECTOR_LIMIT;
    Some(if length > limit {
        planar * (limit / length)
    } else {
        planar
    })
}

pub fn format_readout(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, sanitize(value))
}

fn format_tick_value(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.1}")
    }
}

// ============================================================================
// SCENE BUILDERS
// ============================================================================

pub fn build_scene(kind: GaugeKind, snapshot: &TelemetrySnapshot, style: &GaugeStyle) -> Scene {
    match kind {
        GaugeKind::Attitude => attitude_scene(snapshot.roll, snapshot.pitch, style),
        GaugeKind::Compass => compass_scene(snapshot.heading, style),
        GaugeKind::Altimeter => altimeter_scene(snapshot.altitude, style),
        GaugeKind::Airspeed => airspeed_scene(snapshot.airspeed, style),
        GaugeKind::VerticalSpeed => vertical_speed_scene(snapshot.vertical_speed, style),
        GaugeKind::Imu => imu_scene(snapshot.acceleration, snapshot.angular_velocity, style),
    }
}

pub fn attitude_scene(roll: f64, pitch: f64, style: &GaugeStyle) -> Scene {
    let palette = style.palette();
    let f = style.frame();
    let mut scene = Scene::new();
    add_face(&mut scene, f, &palette);

    let clip = Some((f.center, f.radius));
    let [sky, ground] = horizon_quads(f.center, f.radius, roll, pitch);
    for (quad, color) in [(sky, palette.sky), (ground, palette.ground)] {
        scene.add_command(DrawCommand::Polygon {
            points: quad.to_vec(),
            clip,
            color,
        });
    }

    let rotation = DVec2::from_angle(horizon_rotation(roll));
    let offset = horizon_offset(pitch, f.radius);
    let place = |x: f64, y: f64| f.center + rotation.rotate(DVec2::new(x, y));
    // the horizon line itself spans the whole face
    scene.add_command(DrawCommand::Line {
        from: place(-f.radius, offset),
        to: place(f.radius, offset),
        thickness: (f.size * 0.01).max(1.0),
        color: palette.horizon,
    });

    // Pitch ladder
    let clamped_pitch = sanitize(pitch).clamp(-90.0, 90.0);
    for rung in [-20.0, -10.0, 10.0, 20.0] {
        let y = horizon_offset(clamped_pitch - rung, f.radius);
        if y.abs() > f.radius * 0.7 {
            continue;
        }
        let half = f.radius * if (rung as i32) % 20 == 0 { 0.3 } else { 0.18 };
        scene.add_command(DrawCommand::Line {
            from: place(-half, y),
            to: place(half, y),
            thickness: 1.0,
            color: palette.horizon,
        });
    }

    // Fixed aircraft symbol
    let wing = f.radius * 0.35;
    let gap = f.radius * 0.1;
    for (from, to) in [(-wing, -gap), (gap, wing)] {
        scene.add_command(DrawCommand::Line {
            from: f.center + DVec2::new(from, 0.0),
            to: f.center + DVec2::new(to, 0.0),
            thickness: (f.size * 0.02).max(2.0),
            color: palette.aircraft,
        });
    }
    scene.add_command(DrawCommand::FillCircle {
        center: f.center,
        radius: (f.size * 0.015).max(2.0),
        color: palette.aircraft,
    });

    add_bezel(&mut scene, f, &palette);
    add_readout(
        &mut scene,
        f,
        f.center + DVec2::new(0.0, f.radius * 0.6),
        format!(
            "R {}  P {}",
            format_readout(roll, 1),
            format_readout(pitch, 1)
        ),
        palette.horizon,
    );
    scene
}

pub fn compass_scene(heading: f64, style: &GaugeStyle) -> Scene {
    let palette = style.palette();
    let f = style.frame();
    let mut scene = Scene::new();
    add_face(&mut scene, f, &palette);
    add_bezel(&mut scene, f, &palette);

    let rotation = dial_rotation(heading);
    add_tick_ring(
        &mut scene,
        f,
        TickRing {
            start_deg: rotation,
            sweep_deg: 360.0,
            majors: 12,
            minors_per_major: style.minor_ticks_per_interval,
            closed: true,
        },
        palette.ticks,
    );

    let mut cards = vec![("N", 0.0), ("E", 90.0), ("S", 180.0), ("W", 270.0)];
    if style.compass_ordinals {
        cards.extend([("NE", 45.0), ("SE", 135.0), ("SW", 225.0), ("NW", 315.0)]);
    }
    for (label, bearing) in cards {
        let color = if label == "N" {
            palette.accent
        } else {
            palette.text
        };
        let font_size = f.size * if label.len() == 1 { 0.09 } else { 0.06 };
        scene.add_command(DrawCommand::Text {
            at: polar(f.center, f.radius * 0.68, bearing + rotation),
            text: label.to_string(),
            font_size,
            color,
        });
    }

    // Fixed index at the top of the face
    let tip = polar(f.center, f.radius * 0.82, 0.0);
    let half = f.radius * 0.06;
    scene.add_command(DrawCommand::Polygon {
        points: vec![
            tip,
            tip + DVec2::new(-half, -half * 1.6),
            tip + DVec2::new(half, -half * 1.6),
        ],
        clip: None,
        color: palette.accent,
    });

    add_readout(
        &mut scene,
        f,
        f.center,
        format!("{}°", format_readout(normalize_heading(sanitize(heading).round()), 0)),
        palette.text,
    );
    scene
}

pub fn altimeter_scene(altitude: f64, style: &GaugeStyle) -> Scene {
    let palette = style.palette();
    let f = style.frame();
    let mut scene = Scene::new();
    add_face(&mut scene, f, &palette);
    add_bezel(&mut scene, f, &palette);

    let ring = TickRing {
        start_deg: 0.0,
        sweep_deg: 360.0,
        majors: 10,
        minors_per_major: style.minor_ticks_per_interval,
        closed: true,
    };
    add_tick_ring(&mut scene, f, ring, palette.ticks);
    add_tick_labels(&mut scene, f, ring, palette.text, |i| {
        format_tick_value(style.altitude_range() * i as f64 / 10.0)
    });

    add_title(&mut scene, f, GaugeKind::Altimeter, palette.text);
    add_needle(
        &mut scene,
        f,
        altimeter_needle_angle(altitude, style.max_altitude),
        palette.needle,
    );
    add_readout(
        &mut scene,
        f,
        f.center + DVec2::new(0.0, f.radius * 0.4),
        format_readout(altitude, 1),
        palette.text,
    );
    scene
}

pub fn airspeed_scene(airspeed: f64, style: &GaugeStyle) -> Scene {
    let palette = style.palette();
    let f = style.frame();
    let mut scene = Scene::new();
    add_face(&mut scene, f, &palette);
    add_bezel(&mut scene, f, &palette);

    for arc in airspeed_zones() {
        let color = match arc.zone {
            Zone::Red => palette.zone_red,
            Zone::Yellow => palette.zone_yellow,
            Zone::Green => palette.zone_green,
        };
        scene.add_command(DrawCommand::Ring {
            center: f.center,
            inner_radius: f.radius * 0.84,
            outer_radius: f.radius * 0.94,
            start_deg: arc.start_deg,
            sweep_deg: arc.sweep_deg,
            color,
        });
    }

    let ring = TickRing {
        start_deg: AIRSPEED_START_DEG,
        sweep_deg: AIRSPEED_SWEEP_DEG,
        majors: 6,
        minors_per_major: style.minor_ticks_per_interval,
        closed: false,
    };
    add_tick_ring(&mut scene, f, ring, palette.ticks);
    add_tick_labels(&mut scene, f, ring, palette.text, |i| {
        format_tick_value(style.airspeed_range() * i as f64 / 6.0)
    });

    add_title(&mut scene, f, GaugeKind::Airspeed, palette.text);
    add_needle(
        &mut scene,
        f,
        airspeed_needle_angle(airspeed, style.max_airspeed),
        palette.needle,
    );
    add_readout(
        &mut scene,
        f,
        f.center + DVec2::new(0.0, f.radius * 0.4),
        format_readout(airspeed, 1),
        palette.text,
    );
    scene
}

pub fn vertical_speed_scene(vertical_speed: f64, style: &GaugeStyle) -> Scene {
    let palette = style.palette();
    let f = style.frame();
    let max = style.vertical_speed_range();
    let mut scene = Scene::new();
    add_face(&mut scene, f, &palette);
    add_bezel(&mut scene, f, &palette);

    let ring = TickRing {
        start_deg: VERTICAL_SPEED_ZERO_DEG,
        sweep_deg: 360.0,
        majors: 8,
        minors_per_major: style.minor_ticks_per_interval,
        closed: true,
    };
    add_tick_ring(&mut scene, f, ring, palette.ticks);
    // 0 at the origin, climbs up to +max over the top, descents back round
    add_tick_labels(&mut scene, f, ring, palette.text, |i| {
        if i <= 4 {
            format_tick_value(max * i as f64 / 4.0)
        } else {
            format!("-{}", format_tick_value(max * (8 - i) as f64 / 4.0))
        }
    });

    add_title(&mut scene, f, GaugeKind::VerticalSpeed, palette.text);
    add_needle(
        &mut scene,
        f,
        vertical_speed_needle_angle(vertical_speed, max),
        palette.needle,
    );
    add_readout(
        &mut scene,
        f,
        f.center + DVec2::new(0.0, f.radius * 0.4),
        format_readout(vertical_speed, 1),
        palette.text,
    );
    scene
}

pub fn imu_scene(acceleration: DVec3, angular_velocity: DVec3, style: &GaugeStyle) -> Scene {
    let palette = style.palette();
    let f = style.frame();
    let mut scene = Scene::new();
    add_face(&mut scene, f, &palette);
    add_bezel(&mut scene, f, &palette);

    // Crosshair and the arrow limit
    let limit = f.radius * IMU_VECTOR_LIMIT;
    for (from, to) in [
        (DVec2::new(-limit, 0.0), DVec2::new(limit, 0.0)),
        (DVec2::new(0.0, -limit), DVec2::new(0.0, limit)),
    ] {
        scene.add_command(DrawCommand::Line {
            from: f.center + from,
            to: f.center + to,
            thickness: 1.0,
            color: palette.bezel,
        });
    }
    scene.add_command(DrawCommand::Ring {
        center: f.center,
        inner_radius: limit - 0.5,
        outer_radius: limit + 0.5,
        start_deg: 0.0,
        sweep_deg: 360.0,
        color: palette.bezel,
    });

    if let Some(vector) = imu_vector(acceleration, style.imu_scale, f.radius) {
        let tip = f.center + vector;
        scene.add_command(DrawCommand::Line {
            from: f.center,
            to: tip,
            thickness: (f.size * 0.015).max(2.0),
            color: palette.vector,
        });
        let dir = vector.normalize();
        let head = (f.size * 0.04).min(vector.length());
        let back = tip - dir * head;
        let side = dir.perp() * head * 0.5;
        scene.add_command(DrawCommand::Polygon {
            points: vec![tip, back + side, back - side],
            clip: None,
            color: palette.vector,
        });
    }

    add_title(&mut scene, f, GaugeKind::Imu, palette.text);
    let font_size = f.size * 0.05;
    let line = font_size * 1.2;
    let accel = [acceleration.x, acceleration.y, acceleration.z];
    let gyro = [angular_velocity.x, angular_velocity.y, angular_velocity.z];
    for (i, axis) in ["x", "y", "z"].iter().enumerate() {
        let y = f.center.y + f.radius * 0.25 + line * i as f64;
        scene.add_command(DrawCommand::Text {
            at: DVec2::new(f.center.x - f.radius * 0.4, y),
            text: format!("a{axis} {}", format_readout(accel[i], 1)),
            font_size,
            color: palette.text,
        });
        scene.add_command(DrawCommand::Text {
            at: DVec2::new(f.center.x + f.radius * 0.4, y),
            text: format!("g{axis} {}", format_readout(gyro[i], 1)),
            font_size,
            color: palette.text,
        });
    }
    scene
}

// ============================================================================
// SHARED PIECES
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct TickRing {
    start_deg: f64,
    sweep_deg: f64,
    majors: usize,
    minors_per_major: usize,
    /// Full circle: the last major would land on the first one
    closed: bool,
}

impl TickRing {
    fn major_count(&self) -> usize {
        if self.closed {
            self.majors
        } else {
            self.majors + 1
        }
    }

    fn major_angle(&self, i: usize) -> f64 {
        self.start_deg + self.sweep_deg * i as f64 / self.majors as f64
    }
}

fn add_face(scene: &mut Scene, f: Frame, palette: &Palette) {
    scene.add_command(DrawCommand::FillCircle {
        center: f.center,
        radius: f.radius * 1.08,
        color: palette.bezel,
    });
    scene.add_command(DrawCommand::FillCircle {
        center: f.center,
        radius: f.radius,
        color: palette.face,
    });
}

/// Outline drawn over the face edge
fn add_bezel(scene: &mut Scene, f: Frame, palette: &Palette) {
    scene.add_command(DrawCommand::Ring {
        center: f.center,
        inner_radius: f.radius - 1.0,
        outer_radius: f.radius + 1.0,
        start_deg: 0.0,
        sweep_deg: 360.0,
        color: palette.bezel,
    });
}

fn add_tick_ring(scene: &mut Scene, f: Frame, ring: TickRing, color: Color) {
    let major_len = f.radius * 0.14;
    let minor_len = f.radius * 0.07;
    let outer = f.radius - 1.0;
    let step = ring.sweep_deg / ring.majors as f64;
    for i in 0..ring.major_count() {
        let angle = ring.major_angle(i);
        scene.add_command(DrawCommand::Line {
            from: polar(f.center, outer - major_len, angle),
            to: polar(f.center, outer, angle),
            thickness: 2.0,
            color,
        });
        if i + 1 == ring.major_count() && !ring.closed {
            break;
        }
        for j in 1..ring.minors_per_major {
            let minor = angle + step * j as f64 / ring.minors_per_major as f64;
            scene.add_command(DrawCommand::Line {
                from: polar(f.center, outer - minor_len, minor),
                to: polar(f.center, outer, minor),
                thickness: 1.0,
                color,
            });
        }
    }
}

fn add_tick_labels(
    scene: &mut Scene,
    f: Frame,
    ring: TickRing,
    color: Color,
    label: impl Fn(usize) -> String,
) {
    for i in 0..ring.major_count() {
        scene.add_command(DrawCommand::Text {
            at: polar(f.center, f.radius * 0.68, ring.major_angle(i)),
            text: label(i),
            font_size: f.size * 0.055,
            color,
        });
    }
}

fn add_title(scene: &mut Scene, f: Frame, kind: GaugeKind, color: Color) {
    scene.add_command(DrawCommand::Text {
        at: f.center - DVec2::new(0.0, f.radius * 0.35),
        text: kind.title().to_string(),
        font_size: f.size * 0.05,
        color,
    });
}

fn add_needle(scene: &mut Scene, f: Frame, angle: f64, color: Color) {
    scene.add_command(DrawCommand::Needle {
        from: f.center,
        to: polar(f.center, f.radius * 0.85, angle),
        thickness: (f.size * 0.025).max(2.0),
        color,
    });
    scene.add_command(DrawCommand::Line {
        from: f.center,
        to: polar(f.center, f.radius * 0.15, angle + 180.0),
        thickness: (f.size * 0.025).max(2.0),
        color,
    });
    scene.add_command(DrawCommand::FillCircle {
        center: f.center,
        radius: (f.size * 0.03).max(3.0),
        color,
    });
}

fn add_readout(scene: &mut Scene, f: Frame, at: DVec2, text: String, color: Color) {
    scene.add_command(DrawCommand::Text {
        at,
        text,
        font_size: f.size * 0.08,
        color,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::point_in_polygon;

    const EPS: f64 = 1e-9;

    fn needle_tip(scene: &Scene) -> DVec2 {
        scene
            .commands()
            .iter()
            .find_map(|command| match command {
                DrawCommand::Needle { to, .. } => Some(*to),
                _ => None,
            })
            .expect("scene has a needle")
    }

    #[test]
    fn style_defaults() {
        let style = GaugeStyle::default();
        assert_eq!(style.size, 200);
        assert_eq!(style.color_mode, ColorMode::Light);
        assert_eq!(style.max_altitude, 500.0);
        assert_eq!(style.max_airspeed, 30.0);
        assert_eq!(style.max_vertical_speed, 5.0);
        assert_eq!(face_radius(style.size), 90.0);
    }

    #[test]
    fn horizon_offset_is_monotonic_and_bounded() {
        let radius = 90.0;
        let mut last = f64::NEG_INFINITY;
        for step in -180..=180 {
            let pitch = step as f64 * 0.5;
            let offset = horizon_offset(pitch, radius);
            assert!(offset >= last);
            assert!(offset.abs() <= radius);
            last = offset;
        }
        assert_eq!(horizon_offset(45.0, radius), 45.0);
        assert_eq!(horizon_offset(-90.0, radius), -90.0);
    }

    #[test]
    fn positive_roll_tilts_horizon_clockwise() {
        assert_eq!(horizon_rotation(30.0), 30f64.to_radians());
        let center = DVec2::new(100.0, 100.0);
        let [sky, _] = horizon_quads(center, 90.0, 30.0, 0.0);
        // sky's lower edge is the horizon: right end, then left end
        assert!(sky[2].y > sky[3].y);
        assert!(sky[2].y > center.y && sky[3].y < center.y);
    }

    #[test]
    fn sky_and_ground_cover_the_face() {
        let center = DVec2::new(100.0, 100.0);
        let radius = 90.0;
        for roll in (-180..=180).step_by(15) {
            for pitch in (-90..=90).step_by(15) {
                let [sky, ground] = horizon_quads(center, radius, roll as f64, pitch as f64);
                for k in 0..72 {
                    // just inside the rim, off the exact horizon crossings
                    let p = polar(center, radius * 0.999, k as f64 * 5.0 + 1.25);
                    assert!(
                        point_in_polygon(p, &sky) || point_in_polygon(p, &ground),
                        "gap at roll {roll} pitch {pitch} angle {}",
                        k * 5
                    );
                }
            }
        }
    }

    #[test]
    fn horizon_extent_exceeds_bounding_diagonal() {
        // half diagonal of the face's bounding square plus the largest offset
        assert!(HORIZON_EXTENT > 2.0_f64.sqrt() + 1.0);
    }

    #[test]
    fn compass_wraps_heading() {
        assert_eq!(dial_rotation(370.0), dial_rotation(10.0));
        assert_eq!(dial_rotation(-350.0), dial_rotation(10.0));

        let style = GaugeStyle::default();
        let a = compass_scene(370.0, &style);
        let b = compass_scene(10.0, &style);
        assert_eq!(a.commands(), b.commands());
    }

    #[test]
    fn compass_north_is_accented() {
        let style = GaugeStyle::default();
        let scene = compass_scene(90.0, &style);
        let north = scene
            .commands()
            .iter()
            .find_map(|command| match command {
                DrawCommand::Text { text, at, color, .. } if text == "N" => Some((*at, *color)),
                _ => None,
            })
            .unwrap();
        assert_eq!(north.1, style.palette().accent);
        // heading 90: north sits on the left of the card
        assert!(north.0.x < 100.0);
        assert!((north.0.y - 100.0).abs() < 1e-6);
        assert!(scene.texts().any(|t| t == "90°"));
    }

    #[test]
    fn compass_ordinals_are_optional() {
        let plain = compass_scene(0.0, &GaugeStyle::default());
        assert!(!plain.texts().any(|t| t == "NE"));
        let style = GaugeStyle::builder().compass_ordinals(true).build();
        let full = compass_scene(0.0, &style);
        for label in ["NE", "SE", "SW", "NW"] {
            assert!(full.texts().any(|t| t == label));
        }
    }

    #[test]
    fn altimeter_is_linear() {
        assert_eq!(altimeter_needle_angle(250.0, 500.0), 180.0);
        assert_eq!(altimeter_needle_angle(125.0, 500.0), 90.0);
        assert_eq!(altimeter_needle_angle(0.0, 500.0), 0.0);

        let scene = altimeter_scene(250.0, &GaugeStyle::default());
        let tip = needle_tip(&scene);
        // straight down from the center
        assert!((tip.x - 100.0).abs() < 1e-6);
        assert!(tip.y > 100.0);
    }

    #[test]
    fn airspeed_zone_boundaries() {
        let zones = airspeed_zones();
        assert_eq!(zones[0].start_deg, AIRSPEED_START_DEG);
        assert!((zones[0].sweep_deg - 27.0).abs() < EPS);
        let sweeps: Vec<f64> = zones
            .iter()
            .map(|z| z.sweep_deg / AIRSPEED_SWEEP_DEG * 100.0)
            .collect();
        for (got, want) in sweeps.iter().zip([10.0, 10.0, 60.0, 10.0, 10.0]) {
            assert!((got - want).abs() < EPS);
        }
        // contiguous, ending at +135
        for pair in zones.windows(2) {
            assert!((pair[0].start_deg + pair[0].sweep_deg - pair[1].start_deg).abs() < EPS);
        }
        let last = zones[4];
        assert!((last.start_deg + last.sweep_deg - 135.0).abs() < EPS);
        assert_eq!(
            zones.map(|z| z.zone),
            [Zone::Red, Zone::Yellow, Zone::Green, Zone::Yellow, Zone::Red]
        );
    }

    #[test]
    fn airspeed_clamps() {
        assert_eq!(airspeed_needle_angle(0.0, 30.0), -135.0);
        assert_eq!(airspeed_needle_angle(15.0, 30.0), 0.0);
        assert_eq!(airspeed_needle_angle(30.0, 30.0), 135.0);
        assert_eq!(airspeed_needle_angle(80.0, 30.0), 135.0);
        assert_eq!(airspeed_needle_angle(-4.0, 30.0), -135.0);
    }

    #[test]
    fn vertical_speed_clamps() {
        assert_eq!(vertical_speed_needle_angle(0.0, 5.0), -90.0);
        assert_eq!(vertical_speed_needle_angle(5.0, 5.0), 90.0);
        assert_eq!(vertical_speed_needle_angle(-5.0, 5.0), -270.0);
        assert_eq!(
            vertical_speed_needle_angle(999.0, 5.0),
            vertical_speed_needle_angle(5.0, 5.0)
        );

        let style = GaugeStyle::default();
        let a = vertical_speed_scene(999.0, &style);
        let b = vertical_speed_scene(5.0, &style);
        // only the readout text differs
        let strip = |scene: &Scene| -> Vec<DrawCommand> {
            scene
                .commands()
                .iter()
                .filter(|c| !matches!(c, DrawCommand::Text { text, .. } if text.starts_with(['9', '5'])))
                .cloned()
                .collect()
        };
        assert_eq!(strip(&a), strip(&b));
        assert_eq!(needle_tip(&a), needle_tip(&b));
    }

    #[test]
    fn degenerate_ranges_fall_back() {
        assert_eq!(usable_range(-30.0, 30.0), 30.0);
        assert_eq!(usable_range(0.0, 5.0), 5.0);
        assert_eq!(usable_range(f64::NAN, 5.0), 5.0);
        assert_eq!(usable_range(f64::INFINITY, 500.0), 500.0);

        assert_eq!(airspeed_needle_angle(15.0, -30.0), 0.0);
        assert_eq!(airspeed_needle_angle(15.0, f64::NAN), 0.0);
        assert_eq!(vertical_speed_needle_angle(2.5, f64::NAN), 0.0);
        assert_eq!(vertical_speed_needle_angle(2.5, 0.0), 0.0);
        assert_eq!(altimeter_needle_angle(250.0, 0.0), 180.0);
        assert!(altimeter_needle_angle(250.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn degenerate_style_still_renders() {
        use crate::render::{Canvas, Renderer};

        let style = GaugeStyle::builder()
            .max_airspeed(-30.0)
            .max_vertical_speed(f64::NAN)
            .max_altitude(0.0)
            .build();
        let snapshot = TelemetrySnapshot {
            altitude: 120.0,
            airspeed: 12.0,
            vertical_speed: -2.0,
            ..Default::default()
        };
        let mut frame = vec![0u8; 200 * 200 * 4];
        let mut canvas = Canvas::new(&mut frame, 200, 200).unwrap();
        for kind in GaugeKind::ALL {
            let scene = build_scene(kind, &snapshot, &style);
            assert!(!scene.texts().any(|t| t.contains("NaN") || t.contains("inf")));
            Renderer::without_text().render(&scene, &mut canvas);
        }
    }

    #[test]
    fn vertical_speed_descent_labels_are_signed() {
        let scene = vertical_speed_scene(0.0, &GaugeStyle::default());
        let labels: Vec<&str> = scene.texts().collect();
        for label in ["0", "2.5", "5", "-2.5"] {
            assert!(labels.contains(&label), "missing {label} in {labels:?}");
        }
        // three descent ticks between 0 and the shared full-scale tick
        assert_eq!(labels.iter().filter(|t| t.starts_with('-')).count(), 3);
    }

    #[test]
    fn imu_vector_limits() {
        assert_eq!(imu_vector(DVec3::ZERO, 5.0, 90.0), None);
        assert_eq!(imu_vector(DVec3::new(0.0, 0.0, 9.81), 5.0, 90.0), None);

        let v = imu_vector(DVec3::new(2.0, 0.0, 0.0), 5.0, 90.0).unwrap();
        assert_eq!(v, DVec2::new(10.0, 0.0));

        // +Y points up the screen
        let up = imu_vector(DVec3::new(0.0, 1.0, 0.0), 5.0, 90.0).unwrap();
        assert!(up.y < 0.0);

        let long = imu_vector(DVec3::new(100.0, 100.0, 0.0), 5.0, 90.0).unwrap();
        assert!((long.length() - 72.0).abs() < EPS);
    }

    #[test]
    fn imu_without_vector_skips_arrow() {
        let style = GaugeStyle::default();
        let still = imu_scene(DVec3::ZERO, DVec3::ZERO, &style);
        let moving = imu_scene(DVec3::new(1.0, 1.0, 0.0), DVec3::ZERO, &style);
        assert_eq!(moving.commands().len(), still.commands().len() + 2);
        assert_eq!(still.texts().filter(|t| t.starts_with('a')).count(), 3);
        assert_eq!(still.texts().filter(|t| t.starts_with('g')).count(), 3);
    }

    #[test]
    fn non_finite_values_are_sanitized() {
        assert_eq!(airspeed_needle_angle(f64::NAN, 30.0), -135.0);
        assert_eq!(vertical_speed_needle_angle(f64::INFINITY, 5.0), -90.0);
        assert_eq!(dial_rotation(f64::NAN), 0.0);
        assert_eq!(horizon_offset(f64::NEG_INFINITY, 90.0), 0.0);
        assert_eq!(format_readout(f64::NAN, 1), "0.0");
    }

    #[test]
    fn readout_precision() {
        assert_eq!(format_readout(12.345, 1), "12.3");
        assert_eq!(format_readout(-0.26, 1), "-0.3");
        assert_eq!(format_readout(271.6, 0), "272");

        let scene = altimeter_scene(123.45, &GaugeStyle::default());
        assert!(scene.texts().any(|t| t == "123.5"));
    }

    #[test]
    fn tick_ring_counts() {
        let style = GaugeStyle::default();
        let lines = |scene: &Scene| {
            scene
                .commands()
                .iter()
                .filter(|c| matches!(c, DrawCommand::Line { .. }))
                .count()
        };
        // 10 majors, 4 minors between each (5 subdivisions), plus the needle tail
        assert_eq!(lines(&altimeter_scene(0.0, &style)), 10 + 10 * 4 + 1);
        // bounded arc: 7 majors, 6 intervals of 4 minors
        assert_eq!(lines(&airspeed_scene(0.0, &style)), 7 + 6 * 4 + 1);
    }

    #[test]
    fn scene_is_deterministic() {
        let snapshot = TelemetrySnapshot {
            roll: 12.0,
            pitch: -4.0,
            heading: 271.0,
            altitude: 88.0,
            airspeed: 14.0,
            vertical_speed: -1.2,
            acceleration: DVec3::new(0.3, -0.2, 9.8),
            ..Default::default()
        };
        let style = GaugeStyle::builder().color_mode(ColorMode::Dark).build();
        for kind in GaugeKind::ALL {
            let a = build_scene(kind, &snapshot, &style);
            let b = build_scene(kind, &snapshot, &style);
            assert_eq!(a.commands(), b.commands());
        }
    }
}
