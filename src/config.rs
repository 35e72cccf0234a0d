use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DashboardError;
use crate::gauge::{
    GaugeStyle, DEFAULT_MAX_AIRSPEED, DEFAULT_MAX_ALTITUDE, DEFAULT_MAX_VERTICAL_SPEED,
};
use crate::panel::Channel;

/// Color representation for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Dark,
    #[default]
    Light,
}

/// Colors used by every gauge for one color mode
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub bezel: Color,
    pub face: Color,
    pub ticks: Color,
    pub text: Color,
    pub needle: Color,
    /// North marker and the fixed compass index
    pub accent: Color,
    pub sky: Color,
    pub ground: Color,
    pub horizon: Color,
    pub aircraft: Color,
    pub zone_red: Color,
    pub zone_yellow: Color,
    pub zone_green: Color,
    pub vector: Color,
}

impl Palette {
    pub const DARK: Self = Self {
        background: Color::new(0x12, 0x14, 0x18),
        bezel: Color::new(0x4a, 0x4f, 0x57),
        face: Color::new(0x1e, 0x21, 0x27),
        ticks: Color::new(0xe6, 0xe6, 0xe6),
        text: Color::new(0xf2, 0xf2, 0xf2),
        needle: Color::new(0xff, 0xff, 0xff),
        accent: Color::new(0xff, 0x45, 0x3a),
        sky: Color::new(0x1f, 0x6f, 0xb5),
        ground: Color::new(0x7a, 0x4a, 0x1e),
        horizon: Color::new(0xff, 0xff, 0xff),
        aircraft: Color::new(0xff, 0xc1, 0x07),
        zone_red: Color::new(0xe5, 0x39, 0x35),
        zone_yellow: Color::new(0xfd, 0xd8, 0x35),
        zone_green: Color::new(0x43, 0xa0, 0x47),
        vector: Color::new(0x29, 0xb6, 0xf6),
    };

    pub const LIGHT: Self = Self {
        background: Color::new(0xf4, 0xf5, 0xf7),
        bezel: Color::new(0x9e, 0xa3, 0xab),
        face: Color::new(0xff, 0xff, 0xff),
        ticks: Color::new(0x20, 0x20, 0x20),
        text: Color::new(0x10, 0x10, 0x10),
        needle: Color::new(0x00, 0x00, 0x00),
        accent: Color::new(0xd3, 0x2f, 0x2f),
        sky: Color::new(0x64, 0xb5, 0xf6),
        ground: Color::new(0xa1, 0x88, 0x7f),
        horizon: Color::new(0xff, 0xff, 0xff),
        aircraft: Color::new(0xff, 0x8f, 0x00),
        zone_red: Color::new(0xe5, 0x39, 0x35),
        zone_yellow: Color::new(0xfb, 0xc0, 0x2d),
        zone_green: Color::new(0x43, 0xa0, 0x47),
        vector: Color::new(0x02, 0x77, 0xbd),
    };

    pub const fn for_mode(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Dark => Self::DARK,
            ColorMode::Light => Self::LIGHT,
        }
    }
}

/// Dashboard settings, read from a TOML file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    /// Side of one gauge in pixels
    pub gauge_size: u32,
    pub dark_mode: bool,
    /// Gauges per row
    pub columns: usize,
    pub max_framerate: f64,
    /// Period of the simulated feed
    pub update_interval_ms: u64,

    pub max_altitude: f64,
    pub max_airspeed: f64,
    pub max_vertical_speed: f64,
    pub imu_scale: f64,
    pub compass_ordinals: bool,

    /// TrueType/OpenType font for labels; system fonts are tried when unset
    pub font_path: Option<PathBuf>,

    /// Host topic -> telemetry channel
    pub topics: BTreeMap<String, Channel>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Flight Instruments".to_string(),
            gauge_size: 200,
            dark_mode: false,
            columns: 3,
            max_framerate: 60.0,
            update_interval_ms: 50,
            max_altitude: DEFAULT_MAX_ALTITUDE,
            max_airspeed: DEFAULT_MAX_AIRSPEED,
            max_vertical_speed: DEFAULT_MAX_VERTICAL_SPEED,
            imu_scale: 5.0,
            compass_ordinals: false,
            font_path: None,
            topics: default_topics(),
        }
    }
}

pub fn default_topics() -> BTreeMap<String, Channel> {
    [
        ("/drone/orientation", Channel::Orientation),
        ("/drone/imu", Channel::Imu),
        ("/drone/magnetic_field", Channel::MagneticField),
        ("/drone/altitude", Channel::Altitude),
        ("/drone/airspeed", Channel::Airspeed),
        ("/drone/vertical_speed", Channel::VerticalSpeed),
        ("/drone/position", Channel::Position),
    ]
    .into_iter()
    .map(|(topic, channel)| (topic.to_string(), channel))
    .collect()
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text).map_err(|source| DashboardError::Config {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), "Loaded dashboard config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, DashboardError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        debug!(?config, "Parsed config");
        Ok(config)
    }

    /// Rejects gauge sizes and ranges the gauges cannot be scaled by.
    pub fn validate(&self) -> Result<(), DashboardError> {
        let checks = [
            ("gauge_size", self.gauge_size as f64),
            ("max_altitude", self.max_altitude),
            ("max_airspeed", self.max_airspeed),
            ("max_vertical_speed", self.max_vertical_speed),
            ("imu_scale", self.imu_scale),
            ("max_framerate", self.max_framerate),
        ];
        for (name, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(DashboardError::Range { name, value });
            }
        }
        Ok(())
    }

    pub fn color_mode(&self) -> ColorMode {
        if self.dark_mode {
            ColorMode::Dark
        } else {
            ColorMode::Light
        }
    }

    pub fn gauge_style(&self) -> GaugeStyle {
        GaugeStyle::builder()
            .size(self.gauge_size)
            .color_mode(self.color_mode())
            .max_altitude(self.max_altitude)
            .max_airspeed(self.max_airspeed)
            .max_vertical_speed(self.max_vertical_speed)
            .imu_scale(self.imu_scale)
            .compass_ordinals(self.compass_ordinals)
            .build()
    }
}
