//! Configuration loading and parsing
//!
//! The configuration is `probe.toml`, embedded at compile time and parsed
//! by a small no_std parser. Anything it rejects falls back to defaults.

pub mod loader;
pub mod toml;

pub use loader::{load_config, ConfigError};
pub use toml::parse_config;

use fieldprobe_core::config::ProbeConfig;
use fieldprobe_hal_rp2040::PinConfig;

/// Board wiring: which RP2040 GPIOs do what
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// GPIO behind the logical SDA line
    pub sda: PinConfig,
    /// GPIO behind the logical SCL line
    pub scl: PinConfig,
    /// Activity LED
    pub led: PinConfig,
    pub button_a: PinConfig,
    pub button_b: PinConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let button = |pin| PinConfig {
            pin,
            inverted: true,
            pull_up: true,
        };
        Self {
            sda: PinConfig::new(4),
            scl: PinConfig::new(5),
            led: PinConfig::new(25),
            button_a: button(14),
            button_b: button(15),
        }
    }
}

impl BoardConfig {
    /// Every pin the board claims
    pub fn pins(&self) -> [PinConfig; 5] {
        [self.sda, self.scl, self.led, self.button_a, self.button_b]
    }
}

/// Everything the firmware is configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareConfig {
    pub probe: ProbeConfig,
    pub board: BoardConfig,
}
