//! MPU6050 6-axis IMU driver
//!
//! Register-level access through the Linux i2c-dev interface at the default
//! ±2g / ±250°/s ranges. Requires the `i2c-hardware` feature.

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;

use joyservo_core::driver::{i2c_device_path, DriverStatus};
use joyservo_core::error::{JoyservoError, JoyservoResult};

use crate::messages::Vector3;

const PWR_MGMT_1: u8 = 0x6B;
const ACCEL_XOUT_H: u8 = 0x3B;
const TEMP_OUT_H: u8 = 0x41;
const GYRO_XOUT_H: u8 = 0x43;

/// LSB per g at ±2g
const ACCEL_SCALE: f64 = 16384.0;
/// LSB per °/s at ±250°/s
const GYRO_SCALE: f64 = 131.0;
const STANDARD_GRAVITY: f64 = 9.80665;

/// MPU6050 driver configuration
#[derive(Debug, Clone)]
pub struct Mpu6050Config {
    pub bus: u8,
    /// I2C address (0x68 with AD0 low, 0x69 with AD0 high)
    pub address: u16,
}

impl Default for Mpu6050Config {
    fn default() -> Self {
        Self {
            bus: 1,
            address: 0x68,
        }
    }
}

pub struct Mpu6050Driver {
    config: Mpu6050Config,
    status: DriverStatus,
    device: Option<LinuxI2CDevice>,
}

impl Mpu6050Driver {
    pub fn with_config(config: Mpu6050Config) -> Self {
        Self {
            config,
            status: DriverStatus::Uninitialized,
            device: None,
        }
    }

    pub fn bus(&self) -> u8 {
        self.config.bus
    }

    /// Open the bus and wake the chip
    pub fn init(&mut self) -> JoyservoResult<()> {
        let path = i2c_device_path(self.config.bus);
        let mut device = LinuxI2CDevice::new(&path, self.config.address).map_err(|e| {
            JoyservoError::driver(format!(
                "Failed to open MPU6050 at {} (0x{:02x}): {}",
                path, self.config.address, e
            ))
        })?;
        device
            .smbus_write_byte_data(PWR_MGMT_1, 0)
            .map_err(|e| JoyservoError::driver(format!("MPU6050 wake failed: {}", e)))?;

        self.device = Some(device);
        self.status = DriverStatus::Ready;
        Ok(())
    }

    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        self.device = None;
        self.status = DriverStatus::Shutdown;
        Ok(())
    }

    pub fn status(&self) -> DriverStatus {
        self.status.clone()
    }

    fn read_words<const N: usize>(&mut self, reg: u8) -> JoyservoResult<[i16; N]> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| JoyservoError::driver("MPU6050 not initialized"))?;
        let bytes = device
            .smbus_read_i2c_block_data(reg, (N * 2) as u8)
            .map_err(|e| JoyservoError::driver(format!("MPU6050 read failed: {}", e)))?;
        if bytes.len() < N * 2 {
            return Err(JoyservoError::driver(format!(
                "MPU6050 short read: {} of {} bytes",
                bytes.len(),
                N * 2
            )));
        }

        let mut words = [0i16; N];
        for (i, word) in words.iter_mut().enumerate() {
            *word = i16::from_be_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        }
        self.status = DriverStatus::Running;
        Ok(words)
    }

    /// Acceleration in m/s²
    pub fn read_accel(&mut self) -> JoyservoResult<Vector3> {
        let [x, y, z] = self.read_words::<3>(ACCEL_XOUT_H)?;
        let scale = |raw: i16| raw as f64 / ACCEL_SCALE * STANDARD_GRAVITY;
        Ok(Vector3::new(scale(x), scale(y), scale(z)))
    }

    /// Angular rate in °/s
    pub fn read_gyro(&mut self) -> JoyservoResult<Vector3> {
        let [x, y, z] = self.read_words::<3>(GYRO_XOUT_H)?;
        let scale = |raw: i16| raw as f64 / GYRO_SCALE;
        Ok(Vector3::new(scale(x), scale(y), scale(z)))
    }

    /// Die temperature in °C
    pub fn read_temperature(&mut self) -> JoyservoResult<f64> {
        let [raw] = self.read_words::<1>(TEMP_OUT_H)?;
        Ok(raw as f64 / 340.0 + 36.53)
    }
}
