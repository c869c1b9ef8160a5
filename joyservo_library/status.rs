//! Status projector
//!
//! Turns the servo bank, sensor sampler and controller session into the
//! JSON status object served by the API (and stored by the log store) and
//! into the single console status line.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::control::{ServoBank, SessionStatus};
use crate::messages::{Direction, SensorSnapshot};
use crate::sampler::{SensorSampler, SensorSource};

/// Console line width; shorter lines are space-padded so `\r` overwrites
pub const CONSOLE_WIDTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoStatus {
    pub channel: u8,
    pub angle: u8,
    pub direction: Direction,
    pub hold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServosReport {
    pub channels: Vec<ServoStatus>,
    pub lock: bool,
    pub speed: f32,
    /// Outputs parked by a stop request
    pub stopped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReport {
    #[serde(flatten)]
    pub reading: SensorSnapshot,
    pub connected: bool,
    pub source: SensorSource,
    /// Last read failed; `reading` is from an earlier tick
    pub stale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusDevice {
    pub connected: bool,
    pub bus: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareStatus {
    pub pca: BusDevice,
    pub mpu: BusDevice,
    pub controller: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub servos: ServosReport,
    pub sensor: SensorReport,
    pub hardware: HardwareStatus,
}

/// Buses the hardware probe found devices on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HardwareBuses {
    pub pca: Option<u8>,
    pub mpu: Option<u8>,
}

/// Speed as shown to observers: two decimals, without float step residue
fn display_speed(speed: f32) -> f32 {
    (speed * 100.0).round() / 100.0
}

impl StatusReport {
    /// Read-only projection of the live state
    pub fn project(
        servos: &ServoBank,
        sampler: &SensorSampler,
        controller: SessionStatus,
        buses: HardwareBuses,
    ) -> Self {
        let state = servos.state();
        let channels = state
            .channels()
            .map(|(channel, ch)| ServoStatus {
                channel,
                angle: ch.angle,
                direction: ch.direction,
                hold: ch.hold,
            })
            .collect();

        let health = sampler.status();
        let pca_connected = servos.driver().is_hardware();

        Self {
            servos: ServosReport {
                channels,
                lock: state.is_locked(),
                speed: display_speed(state.speed()),
                stopped: servos.is_parked(),
            },
            sensor: SensorReport {
                reading: sampler.snapshot(),
                connected: health.connected,
                source: health.source,
                stale: health.stale,
            },
            hardware: HardwareStatus {
                pca: BusDevice {
                    connected: pca_connected,
                    bus: buses.pca.filter(|_| pca_connected),
                },
                mpu: BusDevice {
                    connected: health.connected,
                    bus: buses.mpu.filter(|_| health.connected),
                },
                controller,
            },
        }
    }

    /// The fixed-width console line
    pub fn render_line(&self) -> String {
        let servos: String = self
            .servos
            .channels
            .iter()
            .map(|s| {
                format!(
                    "S{}:{}{:3}°{} ",
                    s.channel,
                    s.direction.arrow(),
                    s.angle,
                    if s.hold { 'L' } else { ' ' }
                )
            })
            .collect();

        let r = &self.sensor.reading;
        let sensor = format!(
            "Accel: X:{}{:5.1} Y:{}{:5.1} Z:{}{:5.1}",
            r.direction.x.arrow(),
            r.accel.x,
            r.direction.y.arrow(),
            r.accel.y,
            r.direction.z.arrow(),
            r.accel.z
        );

        let device = |d: &BusDevice| {
            let state = if d.connected { "CONNECTED" } else { "DISCONNECTED" };
            match d.bus {
                Some(bus) => format!("{}({})", state, bus),
                None => format!("{}(-)", state),
            }
        };
        let controller = &self.hardware.controller;
        let ctrl = if controller.connected {
            controller.kind.label()
        } else {
            "DISCONNECTED"
        };
        let lock = if self.servos.lock { " LOCK" } else { "" };
        let hardware = format!(
            "PCA:{} MPU:{} Ctrl:{} Spd:{:.1}x{}",
            device(&self.hardware.pca),
            device(&self.hardware.mpu),
            ctrl,
            self.servos.speed,
            lock
        );

        let line = format!("{}| {} | {}", servos, sensor, hardware);
        format!("{:<width$}", line, width = CONSOLE_WIDTH)
    }
}

/// Self-overwriting status line on stdout
pub struct Console {
    enabled: bool,
    dirty: bool,
}

impl Console {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            dirty: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn show(&mut self, report: &StatusReport) {
        if !self.enabled {
            return;
        }
        let mut out = std::io::stdout().lock();
        // Console output is best effort
        let _ = write!(out, "\r{}", report.render_line());
        let _ = out.flush();
        self.dirty = true;
    }

    /// End the status line so later output starts on a fresh one
    pub fn finish(&mut self) {
        if self.enabled && self.dirty {
            println!();
            self.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ServoDriver;
    use joyservo_core::config::{SensorConfig, ServoConfig};
    use joyservo_core::ControllerKind;
    use std::time::Duration;

    fn report() -> StatusReport {
        let mut bank = ServoBank::new(&ServoConfig::default(), ServoDriver::simulation());
        bank.set_angle(0, 10).unwrap();
        bank.set_hold(1, true).unwrap();
        let mut sampler = SensorSampler::new(None, SensorConfig::default());
        sampler.sample_at(0.0);
        let session = crate::control::ControllerSession::new(Duration::from_secs(3));
        StatusReport::project(&bank, &sampler, session.status(), HardwareBuses::default())
    }

    #[test]
    fn test_speed_rounded_for_display() {
        let mut bank = ServoBank::new(&ServoConfig::default(), ServoDriver::simulation());
        for _ in 0..3 {
            bank.adjust_speed(-0.1).unwrap();
        }
        let sampler = SensorSampler::new(None, SensorConfig::default());
        let session = crate::control::ControllerSession::new(Duration::from_secs(3));
        let report =
            StatusReport::project(&bank, &sampler, session.status(), HardwareBuses::default());
        assert_eq!(report.servos.speed, 0.7);
        assert!(report.render_line().contains("Spd:0.7x"));
    }

    #[test]
    fn test_projection() {
        let report = report();
        assert_eq!(report.servos.channels.len(), 4);
        assert_eq!(report.servos.channels[0].angle, 10);
        assert_eq!(report.servos.channels[0].direction, Direction::Left);
        assert!(report.servos.channels[1].hold);
        assert!(!report.servos.lock);
        assert!(!report.hardware.pca.connected);
        assert!(!report.sensor.connected);
        assert_eq!(report.hardware.controller.kind, ControllerKind::None);
    }

    #[test]
    fn test_console_line() {
        let line = report().render_line();
        assert!(line.starts_with("S0:← 10°  S1:○ 90°L S2:○ 90°  S3:○ 90°  | Accel: X:○  0.0 Y:↑  0.5 Z:○  9.8"));
        assert!(line.contains("PCA:DISCONNECTED(-) MPU:DISCONNECTED(-) Ctrl:DISCONNECTED Spd:1.0x"));
        assert!(line.chars().count() >= CONSOLE_WIDTH);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["servos"]["channels"][0]["direction"], "left");
        assert_eq!(json["sensor"]["source"], "synthetic");
        assert!(json["sensor"]["accel"]["z"].is_number());
        assert_eq!(json["hardware"]["controller"]["connected"], false);

        let back: StatusReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.servos.channels[0].angle, 10);
    }
}
