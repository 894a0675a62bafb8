//! Bit timing for the software engine
//!
//! The engine does not calibrate against a clock. It picks one of three
//! coarse half-period delays from the requested bus speed, so the actual
//! SCL rate depends on GPIO switching overhead as well.

/// Half-period delay applied between clock transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitDelay {
    /// 400 kHz and up
    Fast,
    /// 100 kHz up to 400 kHz
    Standard,
    /// Anything below 100 kHz
    Slow,
}

impl BitDelay {
    /// Pick the delay tier for a target bus speed
    pub const fn for_speed(speed_hz: u32) -> Self {
        if speed_hz >= 400_000 {
            BitDelay::Fast
        } else if speed_hz >= 100_000 {
            BitDelay::Standard
        } else {
            BitDelay::Slow
        }
    }

    /// Delay in microseconds
    pub const fn micros(self) -> u32 {
        match self {
            BitDelay::Fast => 1,
            BitDelay::Standard => 10,
            BitDelay::Slow => 20,
        }
    }
}

impl Default for BitDelay {
    fn default() -> Self {
        BitDelay::Fast
    }
}
