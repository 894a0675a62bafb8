//! Pin strings and allocation tracking
//!
//! Board pins come from config as `"gpio14"`-style strings with optional
//! modifiers, and every pin may be claimed once.

use heapless::FnvIndexSet;

use crate::pins::PinError;

/// Number of user GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// A board pin from config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO number (0-29)
    pub pin: u8,
    /// Active-low
    pub inverted: bool,
    /// Enable the internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    /// Logical level for a raw pin level
    pub fn is_active(&self, high: bool) -> bool {
        high != self.inverted
    }
}

/// Parse a pin string from config
///
/// Supports formats:
/// - "gpio11" -> pin 11
/// - "!gpio12" -> pin 12, active-low
/// - "^gpio4" -> pin 4, pull-up
/// - "^!gpio5" / "!^gpio5" -> both modifiers
pub fn parse_pin_string(s: &str) -> Option<PinConfig> {
    let mut s = s.trim();
    let mut config = PinConfig::default();

    loop {
        if let Some(rest) = s.strip_prefix('!') {
            config.inverted = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('^') {
            config.pull_up = true;
            s = rest;
        } else {
            break;
        }
    }

    let pin: u8 = s.strip_prefix("gpio")?.parse().ok()?;
    if pin as usize >= GPIO_COUNT {
        return None;
    }
    config.pin = pin;

    Some(config)
}

/// GPIO allocator to track pin usage
pub struct GpioAllocator {
    allocated: FnvIndexSet<u8, 32>,
}

impl Default for GpioAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioAllocator {
    pub fn new() -> Self {
        Self {
            allocated: FnvIndexSet::new(),
        }
    }

    /// Claim a GPIO pin
    pub fn allocate(&mut self, pin: u8) -> Result<(), PinError> {
        if pin as usize >= GPIO_COUNT {
            return Err(PinError::InvalidPin);
        }
        match self.allocated.insert(pin) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PinError::AlreadyTaken),
            Err(_) => Err(PinError::InvalidPin),
        }
    }

    pub fn release(&mut self, pin: u8) {
        self.allocated.remove(&pin);
    }

    pub fn is_allocated(&self, pin: u8) -> bool {
        self.allocated.contains(&pin)
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator() {
        let mut alloc = GpioAllocator::new();

        assert!(alloc.allocate(4).is_ok());
        assert!(alloc.is_allocated(4));

        // Can't allocate same pin twice
        assert_eq!(alloc.allocate(4), Err(PinError::AlreadyTaken));
        assert!(alloc.allocate(5).is_ok());
        assert_eq!(alloc.allocated_count(), 2);

        alloc.release(4);
        assert!(!alloc.is_allocated(4));
        assert!(alloc.allocate(4).is_ok());

        assert_eq!(alloc.allocate(30), Err(PinError::InvalidPin));
    }

    #[test]
    fn test_parse_pin_string() {
        assert_eq!(parse_pin_string("gpio11"), Some(PinConfig::new(11)));
        assert_eq!(parse_pin_string("gpio29").map(|p| p.pin), Some(29));

        let pin = parse_pin_string("!gpio12").unwrap();
        assert_eq!(pin.pin, 12);
        assert!(pin.inverted);
        assert!(!pin.pull_up);

        let pin = parse_pin_string("^gpio4").unwrap();
        assert!(pin.pull_up);
        assert!(!pin.inverted);

        for s in ["^!gpio5", "!^gpio5"] {
            let pin = parse_pin_string(s).unwrap();
            assert_eq!(pin.pin, 5);
            assert!(pin.inverted && pin.pull_up);
        }

        // Invalid
        assert_eq!(parse_pin_string("gpio30"), None);
        assert_eq!(parse_pin_string("pin11"), None);
        assert_eq!(parse_pin_string("gpio"), None);
        assert_eq!(parse_pin_string(""), None);
    }

    #[test]
    fn test_active_level() {
        let button = parse_pin_string("^!gpio14").unwrap();
        assert!(button.is_active(false));
        assert!(!button.is_active(true));
        assert!(PinConfig::new(25).is_active(true));
    }
}
