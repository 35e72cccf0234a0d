use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("Could not parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{name} must be a finite number above zero, got {value}")]
    Range { name: &'static str, value: f64 },
    #[error("{0} is not a usable font")]
    Font(PathBuf),
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Could not create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("Surface error: {0}")]
    Surface(#[from] pixels::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelError {
    #[error("Panel was torn down")]
    Disconnected,
    #[error("Panel did not acknowledge the frame in time")]
    Timeout,
}
