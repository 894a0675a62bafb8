//! Events that drive the scanner

/// Scanner state machine inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanEvent {
    /// First trigger after boot
    Start,
    /// User asked for another pass after a finished scan
    Restart,
    /// An address matched a known device kind
    DeviceIdentified,
    /// Last address of the window probed without a match
    RangeExhausted,
    /// Too many reserved addresses answered
    BusFaultDetected,
}
