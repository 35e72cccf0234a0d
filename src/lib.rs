// ============================================================================
// CRATE CONFIGURATION & MODULES
// ============================================================================

//! Flight instrument gauges for drone telemetry.
//!
//! Telemetry comes from a [`feed::SimulatedFeed`] or from a host through the
//! [`panel`] mailbox, is turned into a [`TelemetrySnapshot`], and is drawn by
//! the [`gauge`] engine onto RGBA frames, either headless through
//! [`Dashboard::render_into`] or in a window through [`Dashboard::run`].

pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod gauge;
pub mod orientation;
pub mod panel;
pub mod render;
pub mod telemetry;

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

pub use config::{Color, ColorMode, DashboardConfig, Palette};
pub use dashboard::Dashboard;
pub use error::{DashboardError, PanelError};
pub use feed::{FeedHandle, SimulatedFeed, TelemetrySource};
pub use gauge::{build_scene, GaugeKind, GaugeStyle};
pub use orientation::{normalize_heading, quaternion_to_euler, EulerAngles, Quaternion};
pub use panel::{panel_channel, Channel, Panel, PanelHost, SensorMessage, TimedMessage};
pub use render::{Canvas, DrawCommand, Renderer, Scene};
pub use telemetry::TelemetrySnapshot;
