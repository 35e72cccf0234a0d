use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, info, trace, warn};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::feed::TelemetrySource;
use crate::gauge::{build_scene, GaugeKind, GaugeStyle};
use crate::render::{Canvas, Renderer};
use crate::telemetry::TelemetrySnapshot;

/// Grid of all six gauges sharing one style
pub struct Dashboard {
    config: DashboardConfig,
    style: GaugeStyle,
    renderer: Renderer,
}

impl Dashboard {
    /// Builds the dashboard and loads its font. A configured font that fails
    /// to load is logged and labels are left out.
    pub fn new(config: DashboardConfig) -> Self {
        let renderer = Renderer::load(config.font_path.as_deref()).unwrap_or_else(|err| {
            warn!("{err}, drawing without text");
            Renderer::without_text()
        });
        Self::with_renderer(config, renderer)
    }

    pub fn with_renderer(config: DashboardConfig, renderer: Renderer) -> Self {
        let style = config.gauge_style();
        debug!(size = style.size, text = renderer.has_font(), "Dashboard ready");
        Self {
            config,
            style,
            renderer,
        }
    }

    pub fn style(&self) -> &GaugeStyle {
        &self.style
    }

    fn columns(&self) -> usize {
        self.config.columns.clamp(1, GaugeKind::ALL.len())
    }

    /// Pixel size of the whole grid
    pub fn frame_size(&self) -> (usize, usize) {
        let columns = self.columns();
        let rows = GaugeKind::ALL.len().div_ceil(columns);
        let size = self.style.size as usize;
        (columns * size, rows * size)
    }

    /// Redraws every gauge into an RGBA frame. A frame that does not match
    /// `width x height` is skipped.
    pub fn render_into(
        &self,
        frame: &mut [u8],
        width: usize,
        height: usize,
        snapshot: &TelemetrySnapshot,
    ) {
        let len = frame.len();
        let Some(mut canvas) = Canvas::new(frame, width, height) else {
            debug!(width, height, len, "No drawing surface, skipping frame");
            return;
        };
        canvas.clear(self.style.palette().background);

        let size = self.style.size as usize;
        let columns = self.columns();
        for (i, kind) in GaugeKind::ALL.into_iter().enumerate() {
            let (col, row) = (i % columns, i / columns);
            let mut cell = canvas.viewport(col * size, row * size, size, size);
            let scene = build_scene(kind, snapshot, &self.style);
            self.renderer.render(&scene, &mut cell);
        }
    }

    /// Opens a window and redraws from `source` until the window is closed.
    pub fn run(self, mut source: impl TelemetrySource) -> Result<(), DashboardError> {
        let (logical_width, logical_height) = self.frame_size();

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(
                logical_width as f64,
                logical_height as f64,
            ))
            .with_resizable(false)
            .build(&event_loop)?;
        let window = Arc::new(window);

        // drawn at logical size, the surface scales it up on HiDPI screens
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(
            logical_width as u32,
            logical_height as u32,
            surface_texture,
        )?;
        info!(
            width = logical_width,
            height = logical_height,
            "Dashboard window open"
        );

        let window_clone = window.clone();
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.max_framerate.max(1.0));
        let mut last_frame = Instant::now();
        let mut snapshot = TelemetrySnapshot::default();

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        info!("Window closed");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                            warn!("Could not resize surface: {err}");
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(latest) = source.latest() {
                            snapshot = latest;
                        }
                        trace!(?snapshot, "Redraw");
                        self.render_into(pixels.frame_mut(), logical_width, logical_height, &snapshot);
                        match pixels.render() {
                            Ok(()) => source.rendered(),
                            Err(err) => {
                                warn!("Render failed: {err}");
                                window_target.exit();
                            }
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if last_frame.elapsed() >= frame_duration {
                        window_clone.request_redraw();
                        last_frame = Instant::now();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}
