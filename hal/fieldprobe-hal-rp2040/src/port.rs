//! `GpioPort` over RP2040 `Flex` pins
//!
//! Bus engines address lines by the logical [`PinId`] from config; this
//! port binds each logical id to a physical GPIO at startup. Unbound ids
//! read low and ignore writes.

use embassy_rp::gpio::{AnyPin, Flex, Pull};
use embassy_rp::Peri;
use fieldprobe_hal::{GpioPort, PinId, PinMode};
use heapless::Vec;

/// Lines one port can carry
pub const MAX_LINES: usize = 4;

/// Error binding a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    /// Logical id bound twice
    Duplicate,
    /// No room for another line
    Full,
}

/// GPIO port made of individually bound bidirectional pins
pub struct FlexPort<'d> {
    lines: Vec<(PinId, Flex<'d>), MAX_LINES>,
}

impl<'d> Default for FlexPort<'d> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d> FlexPort<'d> {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Bind a logical pin to a physical GPIO
    ///
    /// The line starts released (input, no pull, latch low).
    pub fn bind(&mut self, id: PinId, pin: Peri<'d, AnyPin>) -> Result<(), PortError> {
        if self.line(id).is_some() {
            return Err(PortError::Duplicate);
        }
        let mut flex = Flex::new(pin);
        flex.set_low();
        flex.set_pull(Pull::None);
        flex.set_as_input();
        self.lines.push((id, flex)).map_err(|_| PortError::Full)
    }

    fn line(&self, id: PinId) -> Option<&Flex<'d>> {
        self.lines.iter().find(|(pin, _)| *pin == id).map(|(_, f)| f)
    }

    fn line_mut(&mut self, id: PinId) -> Option<&mut Flex<'d>> {
        self.lines
            .iter_mut()
            .find(|(pin, _)| *pin == id)
            .map(|(_, f)| f)
    }
}

impl<'d> GpioPort for FlexPort<'d> {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        let Some(flex) = self.line_mut(pin) else {
            return;
        };
        match mode {
            PinMode::Output => flex.set_as_output(),
            PinMode::Input => {
                flex.set_pull(Pull::None);
                flex.set_as_input();
            }
            PinMode::InputPullUp => {
                flex.set_pull(Pull::Up);
                flex.set_as_input();
            }
            PinMode::InputPullDown => {
                flex.set_pull(Pull::Down);
                flex.set_as_input();
            }
        }
    }

    fn read(&self, pin: PinId) -> bool {
        self.line(pin).map(|f| f.is_high()).unwrap_or(false)
    }

    fn write(&mut self, pin: PinId, high: bool) {
        if let Some(flex) = self.line_mut(pin) {
            if high {
                flex.set_high();
            } else {
                flex.set_low();
            }
        }
    }
}
