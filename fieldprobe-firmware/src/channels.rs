//! Inter-task communication
//!
//! The button task reports presses to the controller through a signal.
//! Only the latest press matters, so a `Signal` rather than a `Channel`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// A debounced button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    A,
    B,
    /// Both buttons held together
    Both,
}

/// Latest button press (written by the button task)
pub static BUTTONS: Signal<CriticalSectionRawMutex, ButtonEvent> = Signal::new();
