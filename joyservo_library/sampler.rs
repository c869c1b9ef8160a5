//! Sensor sampler
//!
//! Refreshes the inertial snapshot once per tick, from the IMU when one is
//! attached and from smooth synthetic motion otherwise. A failed read keeps
//! the previous snapshot and marks it stale; enough failures in a row and the
//! device is dropped in favour of synthetic data.

use std::time::{SystemTime, UNIX_EPOCH};

use joyservo_core::config::SensorConfig;
use joyservo_core::error::JoyservoResult;
use serde::{Deserialize, Serialize};

use crate::drivers::ImuDriver;
use crate::messages::{AxisDirections, Direction, SensorSnapshot, Vector3};

/// Where the current snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorSource {
    Device,
    Synthetic,
}

/// Classify each acceleration axis against a threshold
///
/// x reads right/left, y reads up/down, z reads up/down relative to
/// `gravity`.
pub fn classify(accel: &Vector3, threshold: f64, gravity: f64) -> AxisDirections {
    let around = |value: f64, center: f64, pos: Direction, neg: Direction| {
        if value > center + threshold {
            pos
        } else if value < center - threshold {
            neg
        } else {
            Direction::Neutral
        }
    };
    AxisDirections {
        x: around(accel.x, 0.0, Direction::Right, Direction::Left),
        y: around(accel.y, 0.0, Direction::Up, Direction::Down),
        z: around(accel.z, gravity, Direction::Up, Direction::Down),
    }
}

/// Deterministic synthetic reading for wall-clock time `t` (seconds)
pub fn synthetic(t: f64, threshold: f64, gravity: f64) -> SensorSnapshot {
    let accel = Vector3::new(
        (t * 0.5).sin() * 0.5,
        (t * 0.7).cos() * 0.5,
        gravity + (t * 0.3).sin() * 0.2,
    );
    let gyro = Vector3::new(
        (t * 0.2).sin() * 2.0,
        (t * 0.4).cos() * 2.0,
        (t * 0.6).sin() * 2.0,
    );
    SensorSnapshot {
        accel,
        gyro,
        temperature: 25.0 + (t * 0.1).sin() * 0.5,
        direction: classify(&accel, threshold, gravity),
    }
}

fn wall_clock_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Serializable sampler health
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerStatus {
    pub connected: bool,
    pub source: SensorSource,
    pub stale: bool,
    pub consecutive_failures: u32,
}

pub struct SensorSampler {
    device: Option<ImuDriver>,
    config: SensorConfig,
    snapshot: SensorSnapshot,
    source: SensorSource,
    stale: bool,
    consecutive_failures: u32,
}

impl SensorSampler {
    pub fn new(device: Option<ImuDriver>, config: SensorConfig) -> Self {
        let source = if device.is_some() {
            SensorSource::Device
        } else {
            SensorSource::Synthetic
        };
        Self {
            device,
            config,
            snapshot: SensorSnapshot::default(),
            source,
            stale: false,
            consecutive_failures: 0,
        }
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        self.snapshot
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    pub fn source(&self) -> SensorSource {
        self.source
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn status(&self) -> SamplerStatus {
        SamplerStatus {
            connected: self.is_connected(),
            source: self.source,
            stale: self.stale,
            consecutive_failures: self.consecutive_failures,
        }
    }

    pub fn device_mut(&mut self) -> Option<&mut ImuDriver> {
        self.device.as_mut()
    }

    /// Sample using the current wall-clock time
    pub fn tick(&mut self) -> SensorSnapshot {
        self.sample_at(wall_clock_secs())
    }

    /// Sample, using `t` for synthetic data
    pub fn sample_at(&mut self, t: f64) -> SensorSnapshot {
        let Some(device) = self.device.as_mut() else {
            self.snapshot = synthetic(t, self.config.simulated_threshold, self.config.gravity);
            self.source = SensorSource::Synthetic;
            self.stale = false;
            return self.snapshot;
        };

        match read_device(device) {
            Ok((accel, gyro, temperature)) => {
                self.snapshot = SensorSnapshot {
                    accel,
                    gyro,
                    temperature,
                    direction: classify(
                        &accel,
                        self.config.hardware_threshold,
                        self.config.gravity,
                    ),
                };
                self.source = SensorSource::Device;
                self.stale = false;
                self.consecutive_failures = 0;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                self.stale = true;
                tracing::warn!(
                    "Sensor read failed ({} in a row): {}",
                    self.consecutive_failures,
                    e
                );
                if self.consecutive_failures >= self.config.max_consecutive_failures {
                    tracing::error!("Sensor lost; switching to synthetic data");
                    if let Some(mut lost) = self.device.take() {
                        if let Err(e) = lost.shutdown() {
                            tracing::debug!("Lost sensor shutdown: {}", e);
                        }
                    }
                    self.consecutive_failures = 0;
                    return self.sample_at(t);
                }
            }
        }
        self.snapshot
    }

    pub fn shutdown(&mut self) {
        if let Some(device) = self.device.as_mut() {
            if let Err(e) = device.shutdown() {
                tracing::warn!("Sensor shutdown failed: {}", e);
            }
        }
    }
}

fn read_device(device: &mut ImuDriver) -> JoyservoResult<(Vector3, Vector3, f64)> {
    let accel = device.read_accel()?;
    let gyro = device.read_gyro()?;
    let temperature = device.read_temperature()?;
    Ok((accel, gyro, temperature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_classify_thresholds() {
        let dirs = classify(&Vector3::new(0.6, -0.6, 9.8), 0.5, 9.8);
        assert_eq!(dirs.x, Direction::Right);
        assert_eq!(dirs.y, Direction::Down);
        assert_eq!(dirs.z, Direction::Neutral);

        let dirs = classify(&Vector3::new(-0.4, 0.4, 10.5), 0.5, 9.8);
        assert_eq!(dirs.x, Direction::Neutral);
        assert_eq!(dirs.y, Direction::Neutral);
        assert_eq!(dirs.z, Direction::Up);

        // the synthetic threshold is lower
        assert_eq!(classify(&Vector3::new(-0.4, 0.0, 9.8), 0.3, 9.8).x, Direction::Left);
    }

    #[test]
    fn test_synthetic_is_deterministic() {
        let a = synthetic(12.5, 0.3, 9.8);
        let b = synthetic(12.5, 0.3, 9.8);
        assert_eq!(a, b);

        let zero = synthetic(0.0, 0.3, 9.8);
        assert_relative_eq!(zero.accel.x, 0.0);
        assert_relative_eq!(zero.accel.y, 0.5);
        assert_relative_eq!(zero.accel.z, 9.8);
        assert_relative_eq!(zero.gyro.y, 2.0);
        assert_relative_eq!(zero.temperature, 25.0);
        assert_eq!(zero.direction.y, Direction::Up);
    }

    #[test]
    fn test_no_device_uses_synthetic() {
        let mut sampler = SensorSampler::new(None, SensorConfig::default());
        let snap = sampler.sample_at(3.0);
        assert_eq!(snap, synthetic(3.0, 0.3, 9.8));
        assert_eq!(sampler.source(), SensorSource::Synthetic);
        assert!(!sampler.is_connected());
    }

    #[test]
    fn test_device_reading() {
        let mut imu = ImuDriver::simulation();
        if let Some(sim) = imu.as_simulation_mut() {
            sim.set_accel(Vector3::new(1.0, 0.0, 9.8));
        }
        let mut sampler = SensorSampler::new(Some(imu), SensorConfig::default());
        let snap = sampler.sample_at(0.0);
        assert_eq!(snap.accel.x, 1.0);
        assert_eq!(snap.direction.x, Direction::Right);
        assert_eq!(sampler.source(), SensorSource::Device);
        assert!(!sampler.is_stale());
    }

    #[test]
    fn test_failed_read_keeps_previous_snapshot() {
        let mut imu = ImuDriver::simulation();
        if let Some(sim) = imu.as_simulation_mut() {
            sim.set_accel(Vector3::new(0.0, 2.0, 9.8));
        }
        let mut sampler = SensorSampler::new(Some(imu), SensorConfig::default());
        let good = sampler.sample_at(0.0);

        sampler
            .device_mut()
            .and_then(|d| d.as_simulation_mut())
            .unwrap()
            .set_fail_reads(true);
        let after = sampler.sample_at(1.0);

        assert_eq!(after, good);
        assert!(sampler.is_stale());
        assert!(sampler.is_connected());
        assert_eq!(sampler.status().consecutive_failures, 1);
    }

    #[test]
    fn test_repeated_failures_fall_back_to_synthetic() {
        let mut config = SensorConfig::default();
        config.max_consecutive_failures = 3;
        let mut imu = ImuDriver::simulation();
        if let Some(sim) = imu.as_simulation_mut() {
            sim.set_fail_reads(true);
        }
        let mut sampler = SensorSampler::new(Some(imu), config);

        sampler.sample_at(0.0);
        sampler.sample_at(0.1);
        assert!(sampler.is_connected());
        let snap = sampler.sample_at(0.2);

        assert!(!sampler.is_connected());
        assert_eq!(sampler.source(), SensorSource::Synthetic);
        assert!(!sampler.is_stale());
        assert_eq!(snap, synthetic(0.2, 0.3, 9.8));
    }

    #[test]
    fn test_fallback_when_lost_device_refuses_shutdown() {
        let mut config = SensorConfig::default();
        config.max_consecutive_failures = 1;
        let mut imu = ImuDriver::simulation();
        if let Some(sim) = imu.as_simulation_mut() {
            sim.set_fail_reads(true);
        }
        let mut sampler = SensorSampler::new(Some(imu), config);

        let snap = sampler.sample_at(0.0);
        assert!(sampler.device_mut().is_none());
        assert_eq!(sampler.source(), SensorSource::Synthetic);
        assert_eq!(snap, synthetic(0.0, 0.3, 9.8));
    }
}
