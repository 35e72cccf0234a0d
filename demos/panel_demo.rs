use std::thread;
use std::time::{Duration, Instant};

use flight_instruments::config::default_topics;
use flight_instruments::{panel_channel, Dashboard, DashboardConfig, SensorMessage, TimedMessage};
use glam::{DQuat, DVec3};
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let config = DashboardConfig {
        title: "Panel demo".to_string(),
        dark_mode: true,
        compass_ordinals: true,
        ..Default::default()
    };
    let (host, panel) = panel_channel(default_topics());

    // Stand-in host: one batch of messages per frame, waiting for each ack
    thread::spawn(move || {
        let mut rng = rand::rng();
        let start = Instant::now();
        loop {
            let t = start.elapsed().as_secs_f64();
            let heading = (t * 20.0) % 360.0;
            let roll = 30.0 * (t / 2.0).sin();
            let pitch = 15.0 * (t / 3.0).sin();
            let q = DQuat::from_rotation_z(heading.to_radians())
                * DQuat::from_rotation_y(pitch.to_radians())
                * DQuat::from_rotation_x(roll.to_radians());

            let batch = vec![
                TimedMessage::new("/drone/orientation", t, SensorMessage::Orientation(q.into())),
                TimedMessage::new(
                    "/drone/imu",
                    t,
                    SensorMessage::Imu {
                        acceleration: DVec3::new(
                            rng.random_range(-2.0..2.0),
                            rng.random_range(-2.0..2.0),
                            9.81,
                        ),
                        angular_velocity: DVec3::new(
                            rng.random_range(-10.0..10.0),
                            rng.random_range(-10.0..10.0),
                            20.0,
                        ),
                    },
                ),
                TimedMessage::new(
                    "/drone/altitude",
                    t,
                    SensorMessage::Altitude(250.0 + 200.0 * (t / 10.0).sin()),
                ),
                TimedMessage::new(
                    "/drone/airspeed",
                    t,
                    SensorMessage::Airspeed(15.0 + 14.0 * (t / 4.0).sin()),
                ),
                TimedMessage::new(
                    "/drone/vertical_speed",
                    t,
                    SensorMessage::VerticalSpeed(6.0 * (t / 5.0).cos()),
                ),
            ];

            // returns once the frame is drawn; errors once the window closes
            if host.deliver(batch).is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(30));
        }
    });

    println!("Displaying gauges fed through the panel mailbox");
    println!("Close the window to exit");

    Dashboard::new(config).run(panel)?;
    Ok(())
}
