//! Configuration type definitions

use fieldprobe_hal::PinId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default data line (PC1)
pub const DEFAULT_SDA: u8 = 0xC1;
/// Default clock line (PC2)
pub const DEFAULT_SCL: u8 = 0xC2;

/// Bus speed while scanning and identifying
pub const DEFAULT_SCAN_SPEED_HZ: u32 = 100_000;
/// Bus speed while sampling a found sensor
pub const DEFAULT_SENSOR_SPEED_HZ: u32 = 400_000;

/// Highest 7-bit address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pin encoding not on a supported port
    InvalidPin,
    /// SDA and SCL are the same pin
    SharedPin,
    /// Bus speed of zero
    InvalidSpeed,
    /// Window empty or beyond 7 bits
    InvalidWindow,
    /// Fault threshold of zero
    InvalidThreshold,
}

/// Bus wiring and speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusConfig {
    pub sda: PinId,
    pub scl: PinId,
    pub scan_speed_hz: u32,
    pub sensor_speed_hz: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            sda: pin(DEFAULT_SDA),
            scl: pin(DEFAULT_SCL),
            scan_speed_hz: DEFAULT_SCAN_SPEED_HZ,
            sensor_speed_hz: DEFAULT_SENSOR_SPEED_HZ,
        }
    }
}

impl BusConfig {
    /// Build from raw pin encodings
    pub fn from_raw(
        sda: u8,
        scl: u8,
        scan_speed_hz: u32,
        sensor_speed_hz: u32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            sda: PinId::from_raw(sda).ok_or(ConfigError::InvalidPin)?,
            scl: PinId::from_raw(scl).ok_or(ConfigError::InvalidPin)?,
            scan_speed_hz,
            sensor_speed_hz,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sda == self.scl {
            return Err(ConfigError::SharedPin);
        }
        if self.scan_speed_hz == 0 || self.sensor_speed_hz == 0 {
            return Err(ConfigError::InvalidSpeed);
        }
        Ok(())
    }
}

/// Scanner parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanConfig {
    /// First address probed
    pub first_address: u8,
    /// Last address probed (inclusive)
    pub last_address: u8,
    /// ACKs below this are bus noise, not devices
    pub min_valid_address: u8,
    /// Bad ACKs that abort the scan
    pub bus_fault_threshold: u8,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            first_address: 0x04,
            last_address: MAX_ADDRESS,
            min_valid_address: 0x10,
            bus_fault_threshold: 10,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_address > self.last_address || self.last_address > MAX_ADDRESS {
            return Err(ConfigError::InvalidWindow);
        }
        if self.bus_fault_threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        Ok(())
    }

    /// Number of addresses in the window
    pub fn window_len(&self) -> usize {
        (self.last_address as usize + 1).saturating_sub(self.first_address as usize)
    }
}

/// Complete harness configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeConfig {
    pub bus: BusConfig,
    pub scan: ScanConfig,
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bus.validate()?;
        self.scan.validate()
    }
}

const fn pin(raw: u8) -> PinId {
    match PinId::from_raw(raw) {
        Some(pin) => pin,
        None => panic!("invalid default pin"),
    }
}
