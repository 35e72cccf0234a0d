use std::f64::consts::TAU;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use glam::DVec3;
use rand::Rng;
use tracing::{debug, error, info, span, Level};

use crate::orientation::normalize_heading;
use crate::telemetry::TelemetrySnapshot;

/// Anything the dashboard can pull snapshots from.
pub trait TelemetrySource {
    /// Newest snapshot produced since the last call, if any
    fn latest(&mut self) -> Option<TelemetrySnapshot>;

    /// Called once the snapshot from [`TelemetrySource::latest`] is on screen.
    fn rendered(&mut self) {}
}

const GRAVITY: f64 = 9.81;

/// Synthetic flight at time `t` seconds, with a little sensor noise.
pub fn simulate(t: f64, rng: &mut impl Rng) -> TelemetrySnapshot {
    let roll = 25.0 * (TAU * t / 12.0).sin() + rng.random_range(-0.5..0.5);
    let pitch = 10.0 * (TAU * t / 9.0).sin() + rng.random_range(-0.3..0.3);
    let heading = normalize_heading(6.0 * t + 15.0 * (TAU * t / 30.0).sin());
    let altitude = (120.0 + 80.0 * (TAU * t / 60.0).sin()).max(0.0);
    let vertical_speed = 80.0 * TAU / 60.0 * (TAU * t / 60.0).cos();
    let airspeed = (15.0 + 8.0 * (TAU * t / 20.0).sin() + rng.random_range(-0.4..0.4)).max(0.0);

    // gravity seen by a body-frame accelerometer at this attitude
    let (roll_r, pitch_r) = (roll.to_radians(), pitch.to_radians());
    let acceleration = DVec3::new(
        -GRAVITY * pitch_r.sin(),
        GRAVITY * roll_r.sin() * pitch_r.cos(),
        GRAVITY * roll_r.cos() * pitch_r.cos(),
    ) + DVec3::new(
        rng.random_range(-0.2..0.2),
        rng.random_range(-0.2..0.2),
        rng.random_range(-0.2..0.2),
    );
    let angular_velocity = DVec3::new(
        25.0 * TAU / 12.0 * (TAU * t / 12.0).cos(),
        10.0 * TAU / 9.0 * (TAU * t / 9.0).cos(),
        6.0,
    );
    let heading_r = heading.to_radians();
    let magnetic_field = DVec3::new(22.0 * heading_r.cos(), -22.0 * heading_r.sin(), -42.0);

    TelemetrySnapshot {
        roll,
        pitch,
        heading,
        altitude,
        airspeed,
        vertical_speed,
        acceleration,
        angular_velocity,
        magnetic_field,
        latitude: None,
        longitude: None,
    }
}

/// Periodic simulator running on its own thread
#[derive(Debug, Clone, Copy)]
pub struct SimulatedFeed {
    interval: Duration,
}

impl SimulatedFeed {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn spawn(self) -> io::Result<FeedHandle> {
        let (tx_data, rx_data) = channel::bounded(4);
        let (tx_exit, rx_exit) = channel::bounded(1);
        let interval = self.interval;
        let overflow = rx_data.clone();

        let worker = thread::Builder::new()
            .name("Telemetry Simulator".to_owned())
            .spawn(move || {
                let span = span!(Level::INFO, "Telemetry simulator");
                let _enter = span.enter();
                run_simulator(interval, &tx_data, &overflow, &rx_exit);
            })?;
        info!(?interval, "Started simulated feed");

        Ok(FeedHandle {
            snapshots: rx_data,
            exit: Some(tx_exit),
            worker: Some(worker),
        })
    }
}

impl Default for SimulatedFeed {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

fn run_simulator(
    interval: Duration,
    tx: &Sender<TelemetrySnapshot>,
    overflow: &Receiver<TelemetrySnapshot>,
    exit: &Receiver<()>,
) {
    let start = Instant::now();
    let mut rng = rand::rng();
    loop {
        match exit.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let snapshot = simulate(start.elapsed().as_secs_f64(), &mut rng);
        match tx.try_send(snapshot) {
            Ok(()) => {}
            Err(TrySendError::Full(snapshot)) => {
                // nobody is drawing; keep the newest values
                let _ = overflow.try_recv();
                let _ = tx.try_send(snapshot);
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
    debug!("Simulator stopped");
}

/// Owner of a running feed. Dropping it stops and joins the worker.
#[derive(Debug)]
pub struct FeedHandle {
    snapshots: Receiver<TelemetrySnapshot>,
    exit: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Stops the worker now instead of at drop
    pub fn dispose(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(exit) = self.exit.take() {
            let _ = exit.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Simulator thread panicked");
            }
            info!("Simulated feed disposed");
        }
    }
}

impl TelemetrySource for FeedHandle {
    fn latest(&mut self) -> Option<TelemetrySnapshot> {
        self.snapshots.try_iter().last()
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
