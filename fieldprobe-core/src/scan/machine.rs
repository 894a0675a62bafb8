//! Scanner state machine definition

use super::events::ScanEvent;

/// Scanner states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// Waiting for a trigger
    Idle,
    /// Walking the address window
    Scanning,
    /// A known device was identified
    Found,
    /// Window finished or aborted without a known device
    Exhausted,
}

impl ScanState {
    /// Check if a scan pass is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Found | ScanState::Exhausted)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: ScanEvent) -> Self {
        use ScanEvent::*;
        use ScanState::*;

        match (self, event) {
            (Idle, Start) => Scanning,

            (Scanning, DeviceIdentified) => Found,
            (Scanning, RangeExhausted) => Exhausted,
            (Scanning, BusFaultDetected) => Exhausted,

            (Found, Restart) => Scanning,
            (Exhausted, Restart) => Scanning,

            // Default: stay in current state
            _ => self,
        }
    }
}
