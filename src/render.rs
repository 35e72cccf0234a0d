// ============================================================================
// RETAINED MODE SCENE & RASTERIZER
// ============================================================================

use std::path::{Path, PathBuf};

use glam::DVec2;
use rusttype::{point, Font, PositionedGlyph, Scale};
use tracing::{debug, info, warn};

use crate::config::Color;
use crate::error::DashboardError;

/// Fonts tried, in order, when no font path is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// One drawing primitive. Coordinates are pixels relative to the gauge's
/// top-left corner; angles are degrees clockwise from 12 o'clock.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillCircle {
        center: DVec2,
        radius: f64,
        color: Color,
    },
    /// Annular band between two radii, limited to an angular sweep.
    /// A sweep of 360° or more draws a full ring.
    Ring {
        center: DVec2,
        inner_radius: f64,
        outer_radius: f64,
        start_deg: f64,
        sweep_deg: f64,
        color: Color,
    },
    Line {
        from: DVec2,
        to: DVec2,
        thickness: f64,
        color: Color,
    },
    /// Line narrowing from `from` towards `to`
    Needle {
        from: DVec2,
        to: DVec2,
        thickness: f64,
        color: Color,
    },
    Polygon {
        points: Vec<DVec2>,
        /// Circle (center, radius) the fill is clipped to
        clip: Option<(DVec2, f64)>,
        color: Color,
    },
    /// Text centered on `at`
    Text {
        at: DVec2,
        text: String,
        font_size: f64,
        color: Color,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

// ============================================================================
// CANVAS
// ============================================================================

/// RGBA8 frame owned by the caller, optionally narrowed to a viewport.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    stride: usize,
    origin: (usize, usize),
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    /// `None` when the buffer cannot hold `width * height` RGBA pixels.
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 || frame.len() != width * height * 4 {
            return None;
        }
        Some(Self {
            frame,
            stride: width,
            origin: (0, 0),
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sub-canvas whose (0, 0) is `(x, y)` of this one. Clipped to bounds.
    pub fn viewport(&mut self, x: usize, y: usize, width: usize, height: usize) -> Canvas<'_> {
        let x = x.min(self.width);
        let y = y.min(self.height);
        Canvas {
            frame: &mut *self.frame,
            stride: self.stride,
            origin: (self.origin.0 + x, self.origin.1 + y),
            width: width.min(self.width - x),
            height: height.min(self.height - y),
        }
    }

    pub fn clear(&mut self, color: Color) {
        for y in 0..self.height {
            let start = ((self.origin.1 + y) * self.stride + self.origin.0) * 4;
            let row = &mut self.frame[start..start + self.width * 4];
            for chunk in row.chunks_exact_mut(4) {
                chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
            }
        }
    }

    /// RGBA at a local coordinate
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((self.origin.1 + y) * self.stride + self.origin.0 + x) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.frame[idx..idx + 4]);
        Some(out)
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = ((self.origin.1 + y as usize) * self.stride + self.origin.0 + x as usize) * 4;
        let a = alpha.clamp(0.0, 1.0);
        let src = [color.r as f32, color.g as f32, color.b as f32];
        for (channel, s) in src.iter().enumerate() {
            let d = self.frame[idx + channel] as f32;
            self.frame[idx + channel] = (s * a + d * (1.0 - a)).round() as u8;
        }
        self.frame[idx + 3] = 0xff;
    }

    /// Inclusive pixel range covering `[min, max]`, limited to the canvas
    fn pixel_bounds(&self, min: DVec2, max: DVec2) -> Option<(i32, i32, i32, i32)> {
        let x0 = (min.x.floor() as i32).max(0);
        let y0 = (min.y.floor() as i32).max(0);
        let x1 = (max.x.ceil() as i32).min(self.width as i32 - 1);
        let y1 = (max.y.ceil() as i32).min(self.height as i32 - 1);
        (x0 <= x1 && y0 <= y1).then_some((x0, y0, x1, y1))
    }
}

fn pixel_center(x: i32, y: i32) -> DVec2 {
    DVec2::new(x as f64 + 0.5, y as f64 + 0.5)
}

// ============================================================================
// RENDERER
// ============================================================================

pub struct Renderer {
    font: Option<Font<'static>>,
}

impl Renderer {
    pub fn new(font: Option<Font<'static>>) -> Self {
        Self { font }
    }

    /// Renderer that skips every text command
    pub fn without_text() -> Self {
        Self { font: None }
    }

    /// Loads `font_path`, or the first system font found when it is `None`.
    /// A configured path that cannot be loaded is an error; a missing system
    /// font only disables text.
    pub fn load(font_path: Option<&Path>) -> Result<Self, DashboardError> {
        if let Some(path) = font_path {
            let font = load_font(path)?;
            info!(path = %path.display(), "Loaded font");
            return Ok(Self::new(Some(font)));
        }

        for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
            if !candidate.exists() {
                continue;
            }
            match load_font(&candidate) {
                Ok(font) => {
                    info!(path = %candidate.display(), "Loaded system font");
                    return Ok(Self::new(Some(font)));
                }
                Err(err) => debug!("Skipping font: {err}"),
            }
        }

        warn!("No font found, gauge labels and readouts will not be drawn");
        Ok(Self::without_text())
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn render(&self, scene: &Scene, canvas: &mut Canvas) {
        for command in scene.commands() {
            match command {
                DrawCommand::FillCircle {
                    center,
                    radius,
                    color,
                } => fill_circle(canvas, *center, *radius, *color),
                DrawCommand::Ring {
                    center,
                    inner_radius,
                    outer_radius,
                    start_deg,
                    sweep_deg,
                    color,
                } => draw_ring(
                    canvas,
                    *center,
                    *inner_radius,
                    *outer_radius,
                    *start_deg,
                    *sweep_deg,
                    *color,
                ),
                DrawCommand::Line {
                    from,
                    to,
                    thickness,
                    color,
                } => draw_thick_line_aa(canvas, *from, *to, *thickness, 0.0, *color),
                DrawCommand::Needle {
                    from,
                    to,
                    thickness,
                    color,
                } => draw_thick_line_aa(canvas, *from, *to, *thickness, 0.95, *color),
                DrawCommand::Polygon {
                    points,
                    clip,
                    color,
                } => fill_polygon(canvas, points, *clip, *color),
                DrawCommand::Text {
                    at,
                    text,
                    font_size,
                    color,
                } => {
                    if let Some(font) = &self.font {
                        draw_text(canvas, font, *at, text, *font_size as f32, *color);
                    }
                }
            }
        }
    }
}

fn load_font(path: &Path) -> Result<Font<'static>, DashboardError> {
    let data = std::fs::read(path)?;
    Font::try_from_vec(data).ok_or_else(|| DashboardError::Font(path.to_owned()))
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

/// Anti-aliased line. `taper` is the fraction of thickness lost by `to`.
fn draw_thick_line_aa(
    canvas: &mut Canvas,
    from: DVec2,
    to: DVec2,
    thickness: f64,
    taper: f64,
    color: Color,
) {
    let pad = DVec2::splat(thickness.ceil() + 1.0);
    let Some((x0, y0, x1, y1)) = canvas.pixel_bounds(from.min(to) - pad, from.max(to) + pad)
    else {
        return;
    };
    let d = to - from;
    let len_sq = d.length_squared();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = pixel_center(x, y);
            let t = if len_sq > 0.0 {
                ((p - from).dot(d) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let dist = p.distance(from + d * t);
            let local_thickness = thickness * (1.0 - t * taper);
            let aa = (1.0 - (dist - local_thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                canvas.set_pixel(x, y, color, aa as f32);
            }
        }
    }
}

fn fill_circle(canvas: &mut Canvas, center: DVec2, radius: f64, color: Color) {
    let pad = DVec2::splat(radius + 1.0);
    let Some((x0, y0, x1, y1)) = canvas.pixel_bounds(center - pad, center + pad) else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            let aa = (radius - pixel_center(x, y).distance(center) + 0.5).clamp(0.0, 1.0);
            if aa > 0.0 {
                canvas.set_pixel(x, y, color, aa as f32);
            }
        }
    }
}

/// Angle of `offset` from a gauge center, in degrees clockwise from
/// 12 o'clock, within `[0, 360)`
pub fn gauge_angle_of(offset: DVec2) -> f64 {
    offset.x.atan2(-offset.y).to_degrees().rem_euclid(360.0)
}

fn draw_ring(
    canvas: &mut Canvas,
    center: DVec2,
    inner_radius: f64,
    outer_radius: f64,
    start_deg: f64,
    sweep_deg: f64,
    color: Color,
) {
    let pad = DVec2::splat(outer_radius + 1.0);
    let Some((x0, y0, x1, y1)) = canvas.pixel_bounds(center - pad, center + pad) else {
        return;
    };
    let full = sweep_deg >= 360.0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let offset = pixel_center(x, y) - center;
            let dist = offset.length();
            let radial = (outer_radius - dist + 0.5)
                .min(dist - inner_radius + 0.5)
                .clamp(0.0, 1.0);
            if radial <= 0.0 {
                continue;
            }
            if !full && (gauge_angle_of(offset) - start_deg).rem_euclid(360.0) > sweep_deg {
                continue;
            }
            canvas.set_pixel(x, y, color, radial as f32);
        }
    }
}

/// Even-odd point in polygon test
pub fn point_in_polygon(p: DVec2, points: &[DVec2]) -> bool {
    let mut inside = false;
    let mut j = points.len().wrapping_sub(1);
    for (i, a) in points.iter().enumerate() {
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn fill_polygon(canvas: &mut Canvas, points: &[DVec2], clip: Option<(DVec2, f64)>, color: Color) {
    if points.len() < 3 {
        return;
    }
    let (mut min, mut max) = points
        .iter()
        .fold((DVec2::splat(f64::MAX), DVec2::splat(f64::MIN)), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        });
    if let Some((center, radius)) = clip {
        min = min.max(center - DVec2::splat(radius + 1.0));
        max = max.min(center + DVec2::splat(radius + 1.0));
    }
    let Some((x0, y0, x1, y1)) = canvas.pixel_bounds(min, max) else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = pixel_center(x, y);
            if !point_in_polygon(p, points) {
                continue;
            }
            let aa = match clip {
                Some((center, radius)) => (radius - p.distance(center) + 0.5).clamp(0.0, 1.0),
                None => 1.0,
            };
            if aa > 0.0 {
                canvas.set_pixel(x, y, color, aa as f32);
            }
        }
    }
}

fn draw_text(canvas: &mut Canvas, font: &Font, at: DVec2, text: &str, size: f32, color: Color) {
    let scale = Scale::uniform(size);
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();

    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    if min_x >= max_x || min_y >= max_y {
        return;
    }
    let offset_x = at.x.round() as i32 - (max_x - min_x) / 2;
    let offset_y = at.y.round() as i32 - (max_y - min_y) / 2;
    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + gx as i32 + bb.min.x - min_x;
                let py = offset_y + gy as i32 + bb.min.y - min_y;
                canvas.set_pixel(px, py, color, v);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::new(0xff, 0, 0);
    const WHITE: Color = Color::new(0xff, 0xff, 0xff);

    #[test]
    fn mismatched_buffer_has_no_canvas() {
        let mut frame = vec![0u8; 10];
        assert!(Canvas::new(&mut frame, 4, 4).is_none());
        let mut empty: Vec<u8> = Vec::new();
        assert!(Canvas::new(&mut empty, 0, 0).is_none());
    }

    #[test]
    fn viewport_offsets_and_clips() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut canvas = Canvas::new(&mut frame, 8, 8).unwrap();
        {
            let mut view = canvas.viewport(4, 4, 10, 10);
            assert_eq!((view.width(), view.height()), (4, 4));
            view.clear(RED);
        }
        assert_eq!(canvas.pixel(3, 3), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(4, 4), Some([0xff, 0, 0, 0xff]));
        assert_eq!(canvas.pixel(7, 7), Some([0xff, 0, 0, 0xff]));
    }

    #[test]
    fn clipped_polygon_stays_inside_circle() {
        let mut frame = vec![0u8; 20 * 20 * 4];
        let mut canvas = Canvas::new(&mut frame, 20, 20).unwrap();
        canvas.clear(WHITE);
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Polygon {
            points: vec![
                DVec2::new(-50.0, -50.0),
                DVec2::new(70.0, -50.0),
                DVec2::new(70.0, 70.0),
                DVec2::new(-50.0, 70.0),
            ],
            clip: Some((DVec2::new(10.0, 10.0), 5.0)),
            color: RED,
        });
        Renderer::without_text().render(&scene, &mut canvas);
        assert_eq!(canvas.pixel(10, 10), Some([0xff, 0, 0, 0xff]));
        assert_eq!(canvas.pixel(0, 0), Some([0xff, 0xff, 0xff, 0xff]));
        assert_eq!(canvas.pixel(19, 10), Some([0xff, 0xff, 0xff, 0xff]));
    }

    #[test]
    fn ring_respects_sweep() {
        let mut frame = vec![0u8; 40 * 40 * 4];
        let mut canvas = Canvas::new(&mut frame, 40, 40).unwrap();
        let mut scene = Scene::new();
        // right half only: 0..180 clockwise from 12 o'clock
        scene.add_command(DrawCommand::Ring {
            center: DVec2::new(20.0, 20.0),
            inner_radius: 10.0,
            outer_radius: 15.0,
            start_deg: 0.0,
            sweep_deg: 180.0,
            color: RED,
        });
        Renderer::without_text().render(&scene, &mut canvas);
        assert_eq!(canvas.pixel(32, 20), Some([0xff, 0, 0, 0xff]));
        assert_eq!(canvas.pixel(7, 20), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(20, 20), Some([0, 0, 0, 0]));
    }

    #[test]
    fn gauge_angles() {
        assert_eq!(gauge_angle_of(DVec2::new(0.0, -1.0)), 0.0);
        assert!((gauge_angle_of(DVec2::new(1.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((gauge_angle_of(DVec2::new(0.0, 1.0)) - 180.0).abs() < 1e-9);
        assert!((gauge_angle_of(DVec2::new(-1.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn polygon_membership() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        assert!(point_in_polygon(DVec2::new(1.0, 1.0), &square));
        assert!(!point_in_polygon(DVec2::new(3.0, 1.0), &square));
    }

    #[test]
    fn missing_font_path_is_an_error() {
        assert!(Renderer::load(Some(Path::new("/nonexistent/font.ttf"))).is_err());
    }
}
