//! Adapter for running the gauges inside a host-controlled render loop.
//!
//! The host hands over one batch of time-stamped messages per frame and
//! blocks until the panel acknowledges it. The mailbox holds a single frame,
//! so a host can never run ahead of the panel.

use std::collections::BTreeMap;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::default_topics;
use crate::error::PanelError;
use crate::feed::TelemetrySource;
use crate::orientation::{quaternion_to_euler, Quaternion};
use crate::telemetry::TelemetrySnapshot;

/// Telemetry channel a topic feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Orientation,
    Imu,
    MagneticField,
    Altitude,
    Airspeed,
    VerticalSpeed,
    Position,
}

impl Channel {
    const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorMessage {
    Orientation(Quaternion),
    Imu {
        acceleration: DVec3,
        angular_velocity: DVec3,
    },
    MagneticField(DVec3),
    Altitude(f64),
    Airspeed(f64),
    VerticalSpeed(f64),
    Position {
        latitude: f64,
        longitude: f64,
    },
}

impl SensorMessage {
    pub fn channel(&self) -> Channel {
        match self {
            SensorMessage::Orientation(_) => Channel::Orientation,
            SensorMessage::Imu { .. } => Channel::Imu,
            SensorMessage::MagneticField(_) => Channel::MagneticField,
            SensorMessage::Altitude(_) => Channel::Altitude,
            SensorMessage::Airspeed(_) => Channel::Airspeed,
            SensorMessage::VerticalSpeed(_) => Channel::VerticalSpeed,
            SensorMessage::Position { .. } => Channel::Position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedMessage {
    pub topic: String,
    /// Seconds on the host clock
    pub stamp: f64,
    pub payload: SensorMessage,
}

impl TimedMessage {
    pub fn new(topic: impl Into<String>, stamp: f64, payload: SensorMessage) -> Self {
        Self {
            topic: topic.into(),
            stamp,
            payload,
        }
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Folds messages into the current snapshot, newest stamp wins per channel.
#[derive(Debug, Clone)]
pub struct TelemetryAccumulator {
    subscriptions: BTreeMap<String, Channel>,
    snapshot: TelemetrySnapshot,
    last_stamp: [f64; Channel::COUNT],
}

impl TelemetryAccumulator {
    pub fn new(subscriptions: BTreeMap<String, Channel>) -> Self {
        Self {
            subscriptions,
            snapshot: TelemetrySnapshot::default(),
            last_stamp: [f64::NEG_INFINITY; Channel::COUNT],
        }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot
    }

    /// Returns whether the message changed the snapshot
    pub fn apply(&mut self, message: &TimedMessage) -> bool {
        let Some(&channel) = self.subscriptions.get(&message.topic) else {
            trace!(topic = %message.topic, "Ignoring unsubscribed topic");
            return false;
        };
        if channel != message.payload.channel() {
            warn!(
                topic = %message.topic,
                expected = ?channel,
                got = ?message.payload.channel(),
                "Message does not match its topic's channel"
            );
            return false;
        }
        if message.stamp < self.last_stamp[channel.index()] {
            debug!(topic = %message.topic, stamp = message.stamp, "Dropping stale message");
            return false;
        }
        self.last_stamp[channel.index()] = message.stamp;

        let s = self.snapshot;
        self.snapshot = match message.payload {
            SensorMessage::Orientation(q) => s.with_orientation(quaternion_to_euler(q)),
            SensorMessage::Imu {
                acceleration,
                angular_velocity,
            } => TelemetrySnapshot {
                acceleration,
                angular_velocity,
                ..s
            },
            SensorMessage::MagneticField(magnetic_field) => TelemetrySnapshot {
                magnetic_field,
                ..s
            },
            SensorMessage::Altitude(altitude) => TelemetrySnapshot { altitude, ..s },
            SensorMessage::Airspeed(airspeed) => TelemetrySnapshot { airspeed, ..s },
            SensorMessage::VerticalSpeed(vertical_speed) => TelemetrySnapshot {
                vertical_speed,
                ..s
            },
            SensorMessage::Position {
                latitude,
                longitude,
            } => TelemetrySnapshot {
                latitude: Some(latitude),
                longitude: Some(longitude),
                ..s
            },
        };
        true
    }
}

impl Default for TelemetryAccumulator {
    fn default() -> Self {
        Self::new(default_topics())
    }
}

// ============================================================================
// MAILBOX
// ============================================================================

/// One host frame. Call [`RenderFrame::done`] once it has been drawn.
#[derive(Debug)]
pub struct RenderFrame {
    pub messages: Vec<TimedMessage>,
    ack: Sender<()>,
}

impl RenderFrame {
    pub fn done(self) {
        let _ = self.ack.send(());
    }
}

/// Host side of the mailbox
#[derive(Debug, Clone)]
pub struct PanelHost {
    frames: Sender<RenderFrame>,
}

impl PanelHost {
    /// Delivers a batch and blocks until the panel acknowledges it.
    pub fn deliver(&self, messages: Vec<TimedMessage>) -> Result<(), PanelError> {
        let ack = self.send(messages)?;
        ack.recv().map_err(|_| PanelError::Disconnected)
    }

    /// Like [`PanelHost::deliver`], giving up after `timeout`.
    pub fn deliver_timeout(
        &self,
        messages: Vec<TimedMessage>,
        timeout: Duration,
    ) -> Result<(), PanelError> {
        let ack = self.send(messages)?;
        ack.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => PanelError::Timeout,
            RecvTimeoutError::Disconnected => PanelError::Disconnected,
        })
    }

    fn send(&self, messages: Vec<TimedMessage>) -> Result<Receiver<()>, PanelError> {
        let (ack_tx, ack_rx) = channel::bounded(1);
        trace!(count = messages.len(), "Delivering frame");
        self.frames
            .send(RenderFrame {
                messages,
                ack: ack_tx,
            })
            .map_err(|_| PanelError::Disconnected)?;
        Ok(ack_rx)
    }
}

/// Panel side of the mailbox. Dropping it unsubscribes from the host.
#[derive(Debug)]
pub struct Panel {
    frames: Receiver<RenderFrame>,
    accumulator: TelemetryAccumulator,
    /// Applied but not yet drawn
    pending: Vec<RenderFrame>,
}

pub fn panel_channel(subscriptions: BTreeMap<String, Channel>) -> (PanelHost, Panel) {
    let (tx, rx) = channel::bounded(1);
    info!(topics = subscriptions.len(), "Panel subscribed");
    (
        PanelHost { frames: tx },
        Panel {
            frames: rx,
            accumulator: TelemetryAccumulator::new(subscriptions),
            pending: Vec::new(),
        },
    )
}

impl Panel {
    pub fn next_frame(&self) -> Option<RenderFrame> {
        self.frames.try_recv().ok()
    }

    /// Applies every message of `frame`; returns whether anything changed.
    pub fn apply(&mut self, frame: &RenderFrame) -> bool {
        frame
            .messages
            .iter()
            .fold(false, |changed, message| self.accumulator.apply(message) | changed)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.accumulator.snapshot()
    }

    /// Explicit teardown; the host sees [`PanelError::Disconnected`] afterwards.
    pub fn unsubscribe(self) {}
}

/// Frames taken by `latest` are held until `rendered`, so a host's
/// `deliver` returns only after its batch has been drawn.
impl TelemetrySource for Panel {
    fn latest(&mut self) -> Option<TelemetrySnapshot> {
        let mut changed = false;
        while let Some(frame) = self.next_frame() {
            changed |= self.apply(&frame);
            self.pending.push(frame);
        }
        changed.then(|| self.snapshot())
    }

    fn rendered(&mut self) {
        for frame in self.pending.drain(..) {
            frame.done();
        }
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        info!("Panel unsubscribed");
    }
}
