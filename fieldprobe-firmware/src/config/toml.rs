//! Simple TOML parser for the probe configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! `probe.toml`. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, decimal or hex integer)
//! - `[bus]`, `[scan]` and `[board]` section headers
//! - Comments (# ...)
//!
//! Unknown keys are ignored so older firmware accepts newer files.

use heapless::String as HString;

use fieldprobe_hal::PinId;
use fieldprobe_hal_rp2040::{parse_pin_string, PinConfig};

use super::FirmwareConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value of the wrong type or out of range
    InvalidValue,
    /// Key outside any section
    KeyOutsideSection,
    /// Invalid pin string
    InvalidPin,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Bus,
    Scan,
    Board,
}

/// Parse `probe.toml` text on top of the defaults
pub fn parse_config(input: &str) -> Result<FirmwareConfig, ParseError> {
    let mut config = FirmwareConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line)?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    Ok(config)
}

fn parse_section_header(line: &str) -> Result<Section, ParseError> {
    let header = line
        .strip_prefix('[')
        .and_then(|l| l.split('#').next())
        .map(str::trim)
        .and_then(|l| l.strip_suffix(']'))
        .ok_or(ParseError::InvalidSection)?;

    match header.trim() {
        "bus" => Ok(Section::Bus),
        "scan" => Ok(Section::Scan),
        "board" => Ok(Section::Board),
        _ => Err(ParseError::InvalidSection),
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Decimal or `0x` hex, `_` separators allowed
fn parse_int<T: TryFrom<u32>>(value: &str) -> Result<T, ParseError> {
    let mut digits: HString<16> = HString::new();
    for c in value.chars().filter(|c| *c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }

    let n = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => digits.parse::<u32>(),
    }
    .map_err(|_| ParseError::InvalidValue)?;

    T::try_from(n).map_err(|_| ParseError::InvalidValue)
}

/// Logical bus pin like "PC1"
fn parse_logical_pin(value: &str) -> Result<PinId, ParseError> {
    let s = parse_string(value);
    let rest = s.strip_prefix('P').ok_or(ParseError::InvalidPin)?;
    let mut chars = rest.chars();
    let port = match chars.next() {
        Some('A') => 0xA0,
        Some('C') => 0xC0,
        Some('D') => 0xD0,
        _ => return Err(ParseError::InvalidPin),
    };
    let index: u8 = chars.as_str().parse().map_err(|_| ParseError::InvalidPin)?;
    if index > 15 {
        return Err(ParseError::InvalidPin);
    }
    PinId::from_raw(port | index).ok_or(ParseError::InvalidPin)
}

fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    parse_pin_string(parse_string(value)).ok_or(ParseError::InvalidPin)
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut FirmwareConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => return Err(ParseError::KeyOutsideSection),
        Section::Bus => {
            let bus = &mut config.probe.bus;
            match key {
                "sda" => bus.sda = parse_logical_pin(value)?,
                "scl" => bus.scl = parse_logical_pin(value)?,
                "scan_speed_hz" => bus.scan_speed_hz = parse_int(value)?,
                "sensor_speed_hz" => bus.sensor_speed_hz = parse_int(value)?,
                _ => {}
            }
        }
        Section::Scan => {
            let scan = &mut config.probe.scan;
            match key {
                "first_address" => scan.first_address = parse_int(value)?,
                "last_address" => scan.last_address = parse_int(value)?,
                "min_valid_address" => scan.min_valid_address = parse_int(value)?,
                "bus_fault_threshold" => scan.bus_fault_threshold = parse_int(value)?,
                _ => {}
            }
        }
        Section::Board => {
            let board = &mut config.board;
            match key {
                "sda" => board.sda = parse_pin(value)?,
                "scl" => board.scl = parse_pin(value)?,
                "led" => board.led = parse_pin(value)?,
                "button_a" => board.button_a = parse_pin(value)?,
                "button_b" => board.button_b = parse_pin(value)?,
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# comment
[bus]
sda = "PD1"
scl = "PD2"   # inline comment
scan_speed_hz = 50_000
sensor_speed_hz = 400000

[scan]
first_address = 0x08
last_address = 0x77
bus_fault_threshold = 4

[board]
sda = "gpio2"
button_a = "^!gpio10"
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.probe.bus.sda.raw(), 0xD1);
        assert_eq!(config.probe.bus.scl.raw(), 0xD2);
        assert_eq!(config.probe.bus.scan_speed_hz, 50_000);
        assert_eq!(config.probe.scan.first_address, 0x08);
        assert_eq!(config.probe.scan.last_address, 0x77);
        assert_eq!(config.probe.scan.bus_fault_threshold, 4);
        // Untouched keys keep defaults
        assert_eq!(config.probe.scan.min_valid_address, 0x10);
        assert_eq!(config.board.sda.pin, 2);
        assert_eq!(config.board.scl.pin, 5);

        let button = config.board.button_a;
        assert_eq!(button.pin, 10);
        assert!(button.inverted && button.pull_up);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<u8>("0x7F"), Ok(0x7F));
        assert_eq!(parse_int::<u8>("16"), Ok(16));
        assert_eq!(parse_int::<u32>("100_000"), Ok(100_000));
        assert_eq!(parse_int::<u8>("0x100"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u8>("ten"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_parse_logical_pin() {
        assert_eq!(parse_logical_pin("\"PC1\"").map(|p| p.raw()), Ok(0xC1));
        assert_eq!(parse_logical_pin("PA15").map(|p| p.raw()), Ok(0xAF));
        assert_eq!(parse_logical_pin("PB1"), Err(ParseError::InvalidPin));
        assert_eq!(parse_logical_pin("PC16"), Err(ParseError::InvalidPin));
        assert_eq!(parse_logical_pin("C1"), Err(ParseError::InvalidPin));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_config("[motors]"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("sda = \"PC1\""), Err(ParseError::KeyOutsideSection));
        assert_eq!(
            parse_config("[board]\nled = \"gpio31\""),
            Err(ParseError::InvalidPin)
        );
    }

    #[test]
    fn test_embedded_file_parses() {
        let config = parse_config(include_str!("../../probe.toml")).unwrap();
        assert_eq!(config, FirmwareConfig::default());
    }
}
