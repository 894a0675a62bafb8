//! Bus error type shared by both engines

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Errors from an I2C transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Address or data byte was not acknowledged
    Nack,
    /// Hardware event wait exceeded its spin limit
    Timeout,
}

impl embedded_hal::i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            BusError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            BusError::Timeout => ErrorKind::Other,
        }
    }
}
