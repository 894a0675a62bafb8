//! Configuration loading
//!
//! Parses the embedded `probe.toml`, validates it and checks the board
//! wiring for conflicts. Falls back to built-in defaults on any error.

use defmt::*;

use fieldprobe_core::config::ConfigError as InvalidConfig;
use fieldprobe_hal_rp2040::GpioAllocator;

use super::toml::{parse_config, ParseError};
use super::{BoardConfig, FirmwareConfig};

/// Configuration loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML text rejected by the parser
    Parse(ParseError),
    /// Values parsed but out of range
    Invalid(InvalidConfig),
    /// Two board functions on the same GPIO
    PinConflict(u8),
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<InvalidConfig> for ConfigError {
    fn from(e: InvalidConfig) -> Self {
        ConfigError::Invalid(e)
    }
}

/// Parse and validate a configuration
pub fn try_load(source: &str) -> Result<FirmwareConfig, ConfigError> {
    let config = parse_config(source)?;
    config.probe.validate()?;
    check_board(&config.board)?;
    Ok(config)
}

/// Load configuration, falling back to defaults
pub fn load_config(source: &str) -> FirmwareConfig {
    match try_load(source) {
        Ok(config) => {
            log_config_summary(&config);
            config
        }
        Err(e) => {
            error!("Configuration rejected: {:?}", e);
            warn!("Using built-in defaults");
            FirmwareConfig::default()
        }
    }
}

fn check_board(board: &BoardConfig) -> Result<(), ConfigError> {
    let mut allocator = GpioAllocator::new();
    for pin in board.pins() {
        allocator
            .allocate(pin.pin)
            .map_err(|_| ConfigError::PinConflict(pin.pin))?;
    }
    Ok(())
}

fn log_config_summary(config: &FirmwareConfig) {
    let bus = &config.probe.bus;
    let scan = &config.probe.scan;
    info!(
        "Bus: sda={=u8:#x} scl={=u8:#x} scan={}Hz sensor={}Hz",
        bus.sda.raw(),
        bus.scl.raw(),
        bus.scan_speed_hz,
        bus.sensor_speed_hz
    );
    info!(
        "Scan: {=u8:#x}..={=u8:#x}, valid from {=u8:#x}, fault after {}",
        scan.first_address,
        scan.last_address,
        scan.min_valid_address,
        scan.bus_fault_threshold
    );
    debug!(
        "Board: sda=gpio{} scl=gpio{} led=gpio{}",
        config.board.sda.pin,
        config.board.scl.pin,
        config.board.led.pin
    );
}
