//! GPIO pin abstractions
//!
//! Pins are named by a one-byte encoding: the port in the high nibble and
//! the bit index in the low nibble, so `0xC1` is port C, pin 1.

/// GPIO port letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    A,
    C,
    D,
}

impl Port {
    /// High-nibble code for this port
    pub const fn code(self) -> u8 {
        match self {
            Port::A => 0xA,
            Port::C => 0xC,
            Port::D => 0xD,
        }
    }

    /// Port for a high-nibble code, if supported
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0xA => Some(Port::A),
            0xC => Some(Port::C),
            0xD => Some(Port::D),
            _ => None,
        }
    }
}

/// Encoded pin identifier (port + bit index)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinId {
    port: Port,
    index: u8,
}

impl PinId {
    /// Create a pin identifier
    ///
    /// Returns `None` if `index` is above 15.
    pub const fn new(port: Port, index: u8) -> Option<Self> {
        if index > 15 {
            return None;
        }
        Some(Self { port, index })
    }

    /// Decode a raw `0xPN` byte
    ///
    /// Unsupported ports (anything other than A, C and D) are rejected.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match Port::from_code(raw >> 4) {
            Some(port) => Some(Self {
                port,
                index: raw & 0x0F,
            }),
            None => None,
        }
    }

    /// Raw `0xPN` encoding
    pub const fn raw(self) -> u8 {
        (self.port.code() << 4) | self.index
    }

    /// Port of this pin
    pub const fn port(self) -> Port {
        self.port
    }

    /// Bit index within the port (0-15)
    pub const fn index(self) -> u8 {
        self.index
    }

    /// Single-bit mask for this pin within its port register
    pub const fn mask(self) -> u16 {
        1 << self.index
    }
}

/// Pin direction / bias mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Push-pull output
    Output,
    /// Floating input (releases an open-drain line)
    Input,
    /// Input with internal pull-up
    InputPullUp,
    /// Input with internal pull-down
    InputPullDown,
}

impl PinMode {
    /// Check if this mode drives the pin
    pub fn is_output(&self) -> bool {
        matches!(self, PinMode::Output)
    }
}

/// A bank of GPIO pins addressed by [`PinId`]
///
/// Implementations treat pins they do not own as no-ops: reads of an
/// unknown pin return `false`, writes and mode changes are ignored.
pub trait GpioPort {
    /// Set the direction and bias of a pin
    fn set_mode(&mut self, pin: PinId, mode: PinMode);

    /// Read the input level of a pin (true = high)
    fn read(&self, pin: PinId) -> bool;

    /// Set the output latch of a pin
    fn write(&mut self, pin: PinId, high: bool);

    /// Set the mode of a raw-encoded pin, ignoring invalid encodings
    fn set_mode_raw(&mut self, raw: u8, mode: PinMode) {
        if let Some(pin) = PinId::from_raw(raw) {
            self.set_mode(pin, mode);
        }
    }

    /// Read a raw-encoded pin; invalid encodings read low
    fn read_raw(&self, raw: u8) -> bool {
        PinId::from_raw(raw).map(|pin| self.read(pin)).unwrap_or(false)
    }

    /// Write a raw-encoded pin, ignoring invalid encodings
    fn write_raw(&mut self, raw: u8, high: bool) {
        if let Some(pin) = PinId::from_raw(raw) {
            self.write(pin, high);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_encoding() {
        let pin = PinId::from_raw(0xC1).unwrap();
        assert_eq!(pin.port(), Port::C);
        assert_eq!(pin.index(), 1);
        assert_eq!(pin.raw(), 0xC1);
        assert_eq!(pin.mask(), 0b10);

        let pin = PinId::from_raw(0xDF).unwrap();
        assert_eq!(pin.port(), Port::D);
        assert_eq!(pin.index(), 15);
    }

    #[test]
    fn test_invalid_ports_rejected() {
        assert_eq!(PinId::from_raw(0x00), None);
        assert_eq!(PinId::from_raw(0xB3), None);
        assert_eq!(PinId::from_raw(0xE0), None);
        assert_eq!(PinId::from_raw(0x9F), None);
    }

    #[test]
    fn test_index_range() {
        assert!(PinId::new(Port::A, 15).is_some());
        assert!(PinId::new(Port::A, 16).is_none());
    }

    struct Recorder {
        writes: u8,
    }

    impl GpioPort for Recorder {
        fn set_mode(&mut self, _pin: PinId, _mode: PinMode) {
            self.writes += 1;
        }

        fn read(&self, _pin: PinId) -> bool {
            true
        }

        fn write(&mut self, _pin: PinId, _high: bool) {
            self.writes += 1;
        }
    }

    #[test]
    fn test_raw_helpers_ignore_invalid() {
        let mut port = Recorder { writes: 0 };
        port.write_raw(0x12, true);
        port.set_mode_raw(0xF0, PinMode::Output);
        assert_eq!(port.writes, 0);
        assert!(!port.read_raw(0x12));

        port.write_raw(0xA2, true);
        port.set_mode_raw(0xA2, PinMode::Input);
        assert_eq!(port.writes, 2);
        assert!(port.read_raw(0xA2));
    }
}
