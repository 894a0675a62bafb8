//! I2C bus abstractions
//!
//! [`I2cBus`] is the master-side contract both bus engines provide and the
//! register helpers and device identification consume. [`I2cPeripheral`]
//! is the flag-level view of an on-chip I2C block used by the
//! hardware-assisted engine.

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices. Every call is a complete transaction: it opens
/// with START and is closed with STOP, even when it fails.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read
    ///
    /// This is commonly used to write a register address then read data.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Address-only transaction
    ///
    /// Returns true if a device acknowledged `address`.
    fn probe(&mut self, address: u8) -> bool;
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000, // 100kHz standard mode
        }
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };
}

/// Compound hardware events a master waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cEvent {
    /// START sent, peripheral is bus master
    MasterModeSelect,
    /// Address acknowledged, transmitter mode
    TransmitterModeSelected,
    /// Address acknowledged, receiver mode
    ReceiverModeSelected,
    /// Last data byte shifted out and acknowledged
    ByteTransmitted,
}

/// Individual status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cFlag {
    /// Bus busy
    Busy,
    /// Transmit data register empty
    TxEmpty,
    /// Receive data register not empty
    RxNotEmpty,
    /// Acknowledge failure
    AckFailure,
}

/// On-chip I2C master peripheral
///
/// Mirrors the event/flag interface of the common STM32-style I2C block.
/// Nothing here blocks; waiting is the caller's job.
pub trait I2cPeripheral {
    /// Program the bus clock
    fn set_frequency(&mut self, frequency: u32);

    /// Request a START condition
    fn generate_start(&mut self);

    /// Request a STOP condition
    fn generate_stop(&mut self);

    /// Load the address byte for a 7-bit address and direction
    fn send_address(&mut self, address: u8, read: bool);

    /// Load one data byte for transmission
    fn send_data(&mut self, byte: u8);

    /// Take one received data byte
    fn receive_data(&mut self) -> u8;

    /// Enable or disable the ACK sent after each received byte
    fn set_ack(&mut self, enabled: bool);

    /// Check whether an event has occurred
    fn check_event(&self, event: I2cEvent) -> bool;

    /// Check a single status flag
    fn flag(&self, flag: I2cFlag) -> bool;

    /// Clear a status flag
    fn clear_flag(&mut self, flag: I2cFlag);
}
