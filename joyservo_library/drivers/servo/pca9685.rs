//! PCA9685 PWM servo driver
//!
//! 16-channel, 12-bit PWM controller on I2C. Register-level access through
//! the Linux i2c-dev interface. Requires the `i2c-hardware` feature.

use std::thread::sleep;
use std::time::Duration;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;

use joyservo_core::driver::{i2c_device_path, DriverStatus};
use joyservo_core::error::{JoyservoError, JoyservoResult};

const MODE1: u8 = 0x00;
const MODE2: u8 = 0x01;
const LED0_ON_L: u8 = 0x06;
const ALL_LED_ON_L: u8 = 0xFA;
const PRESCALE: u8 = 0xFE;

const RESTART: u8 = 0x80;
const SLEEP: u8 = 0x10;
const ALLCALL: u8 = 0x01;
const OUTDRV: u8 = 0x04;

const OSCILLATOR_HZ: f64 = 25_000_000.0;

/// PCA9685 configuration
#[derive(Debug, Clone)]
pub struct Pca9685Config {
    pub bus: u8,
    /// I2C address (default: 0x40)
    pub address: u16,
}

impl Default for Pca9685Config {
    fn default() -> Self {
        Self {
            bus: 1,
            address: 0x40,
        }
    }
}

pub struct Pca9685Driver {
    config: Pca9685Config,
    status: DriverStatus,
    device: Option<LinuxI2CDevice>,
}

fn bus_error<E: std::fmt::Display>(what: &'static str) -> impl FnOnce(E) -> JoyservoError {
    move |e| JoyservoError::driver(format!("PCA9685 {}: {}", what, e))
}

impl Pca9685Driver {
    pub fn with_config(config: Pca9685Config) -> Self {
        Self {
            config,
            status: DriverStatus::Uninitialized,
            device: None,
        }
    }

    pub fn bus(&self) -> u8 {
        self.config.bus
    }

    fn device(&mut self) -> JoyservoResult<&mut LinuxI2CDevice> {
        self.device
            .as_mut()
            .ok_or_else(|| JoyservoError::driver("PCA9685 not initialized"))
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> JoyservoResult<()> {
        self.device()?
            .smbus_write_byte_data(reg, value)
            .map_err(bus_error("write"))
    }

    fn read_reg(&mut self, reg: u8) -> JoyservoResult<u8> {
        self.device()?
            .smbus_read_byte_data(reg)
            .map_err(bus_error("read"))
    }

    fn write_on_off(&mut self, base: u8, on: u16, off: u16) -> JoyservoResult<()> {
        self.write_reg(base, (on & 0xFF) as u8)?;
        self.write_reg(base + 1, (on >> 8) as u8)?;
        self.write_reg(base + 2, (off & 0xFF) as u8)?;
        self.write_reg(base + 3, (off >> 8) as u8)
    }

    /// Open the bus and bring the chip out of sleep with all outputs off
    pub fn init(&mut self) -> JoyservoResult<()> {
        let path = i2c_device_path(self.config.bus);
        let device = LinuxI2CDevice::new(&path, self.config.address).map_err(|e| {
            JoyservoError::driver(format!(
                "Failed to open PCA9685 at {} (0x{:02x}): {}",
                path, self.config.address, e
            ))
        })?;
        self.device = Some(device);

        self.set_all_off()?;
        self.write_reg(MODE2, OUTDRV)?;
        self.write_reg(MODE1, ALLCALL)?;
        sleep(Duration::from_millis(5));
        let mode1 = self.read_reg(MODE1)? & !SLEEP;
        self.write_reg(MODE1, mode1)?;
        sleep(Duration::from_millis(5));

        self.status = DriverStatus::Ready;
        Ok(())
    }

    pub fn shutdown(&mut self) -> JoyservoResult<()> {
        if self.device.is_some() {
            self.set_all_off()?;
        }
        self.device = None;
        self.status = DriverStatus::Shutdown;
        Ok(())
    }

    pub fn status(&self) -> DriverStatus {
        self.status.clone()
    }

    pub fn set_frequency(&mut self, hz: u16) -> JoyservoResult<()> {
        if hz == 0 {
            return Err(JoyservoError::driver("PWM frequency must be positive"));
        }
        let prescale = (OSCILLATOR_HZ / 4096.0 / hz as f64 - 1.0)
            .round()
            .clamp(3.0, 255.0) as u8;

        let old_mode = self.read_reg(MODE1)?;
        // Prescale can only be written while asleep
        self.write_reg(MODE1, (old_mode & 0x7F) | SLEEP)?;
        self.write_reg(PRESCALE, prescale)?;
        self.write_reg(MODE1, old_mode)?;
        sleep(Duration::from_millis(5));
        self.write_reg(MODE1, old_mode | RESTART)
    }

    pub fn set_pulse(&mut self, channel: u8, on: u16, off: u16) -> JoyservoResult<()> {
        if channel >= 16 {
            return Err(JoyservoError::driver("Invalid channel (0-15)"));
        }
        self.write_on_off(LED0_ON_L + 4 * channel, on, off)?;
        self.status = DriverStatus::Running;
        Ok(())
    }

    pub fn set_all_off(&mut self) -> JoyservoResult<()> {
        self.write_on_off(ALL_LED_ON_L, 0, 0)
    }
}
