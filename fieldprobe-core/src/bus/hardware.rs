//! Hardware-assisted I2C master
//!
//! Drives an on-chip peripheral through its event/flag interface. Every
//! wait is a bounded spin; running out of spins yields
//! [`BusError::Timeout`] instead of hanging the caller. Once START has
//! been requested, STOP is always requested before returning.

use fieldprobe_hal::{I2cBus, I2cConfig, I2cEvent, I2cFlag, I2cPeripheral};

use super::error::BusError;

/// Polls per event wait before giving up
pub const SPIN_LIMIT: u32 = 10_000;

/// I2C master on top of an [`I2cPeripheral`]
pub struct HardwareI2c<P> {
    periph: P,
    config: I2cConfig,
}

impl<P: I2cPeripheral> HardwareI2c<P> {
    pub fn new(mut periph: P, config: I2cConfig) -> Self {
        periph.set_frequency(config.frequency);
        Self { periph, config }
    }

    pub fn set_speed(&mut self, speed_hz: u32) {
        self.config.frequency = speed_hz;
        self.periph.set_frequency(speed_hz);
    }

    pub fn config(&self) -> I2cConfig {
        self.config
    }

    pub fn peripheral(&self) -> &P {
        &self.periph
    }

    pub fn release(self) -> P {
        self.periph
    }

    fn wait_event(&self, event: I2cEvent) -> Result<(), BusError> {
        for _ in 0..SPIN_LIMIT {
            if self.periph.check_event(event) {
                return Ok(());
            }
        }
        Err(BusError::Timeout)
    }

    fn wait_flag(&self, flag: I2cFlag) -> Result<(), BusError> {
        for _ in 0..SPIN_LIMIT {
            if self.periph.flag(flag) {
                return Ok(());
            }
        }
        Err(BusError::Timeout)
    }

    /// START plus address phase
    ///
    /// A mode-select wait that fails with the ACK-failure flag raised is a
    /// NACK, otherwise a timeout.
    fn begin(&mut self, address: u8, read: bool) -> Result<(), BusError> {
        self.periph.clear_flag(I2cFlag::AckFailure);
        self.periph.generate_start();
        self.wait_event(I2cEvent::MasterModeSelect)?;

        self.periph.send_address(address, read);
        let selected = if read {
            I2cEvent::ReceiverModeSelected
        } else {
            I2cEvent::TransmitterModeSelected
        };
        self.wait_event(selected).map_err(|e| {
            if self.periph.flag(I2cFlag::AckFailure) {
                BusError::Nack
            } else {
                e
            }
        })
    }

    fn finish<R>(&mut self, result: Result<R, BusError>) -> Result<R, BusError> {
        self.periph.generate_stop();
        result
    }

    fn send(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.begin(address, false)?;
        for &byte in data {
            self.wait_flag(I2cFlag::TxEmpty)?;
            self.periph.send_data(byte);
            self.wait_event(I2cEvent::ByteTransmitted).map_err(|e| {
                if self.periph.flag(I2cFlag::AckFailure) {
                    BusError::Nack
                } else {
                    e
                }
            })?;
        }
        Ok(())
    }

    /// Read `buf.len()` bytes, NACKing the last one
    fn receive(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        let last = buf.len().saturating_sub(1);
        self.periph.set_ack(last > 0);
        self.begin(address, true)?;
        for (i, slot) in buf.iter_mut().enumerate() {
            if i == last {
                self.periph.set_ack(false);
            }
            self.wait_flag(I2cFlag::RxNotEmpty)?;
            *slot = self.periph.receive_data();
        }
        Ok(())
    }
}

impl<P: I2cPeripheral> I2cBus for HardwareI2c<P> {
    type Error = BusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        let result = self.send(address, data);
        self.finish(result)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        if buf.is_empty() {
            return Ok(());
        }
        let result = self.receive(address, buf);
        self.periph.set_ack(true);
        self.finish(result)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), BusError> {
        self.write(address, write_data)?;
        self.read(address, read_buf)
    }

    fn probe(&mut self, address: u8) -> bool {
        let result = self.begin(address, false);
        self.finish(result).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Event-level model of an on-chip block with at most one target
    #[derive(Default)]
    struct MockPeripheral {
        target: Option<u8>,
        /// Never reach master mode
        hung: bool,
        frequency: u32,
        started: bool,
        addressed: Option<(u8, bool)>,
        ack_failure: bool,
        ack_enabled: bool,
        /// ACK setting in force for each received byte
        acks: Vec<bool>,
        sent: Vec<u8>,
        rx: VecDeque<u8>,
        starts: u32,
        stops: u32,
        polls: Cell<u32>,
    }

    impl MockPeripheral {
        fn with_target(address: u8) -> Self {
            Self {
                target: Some(address),
                ..Default::default()
            }
        }

        fn target_selected(&self) -> bool {
            matches!(self.addressed, Some((a, _)) if Some(a) == self.target)
        }
    }

    impl I2cPeripheral for MockPeripheral {
        fn set_frequency(&mut self, frequency: u32) {
            self.frequency = frequency;
        }

        fn generate_start(&mut self) {
            self.starts += 1;
            self.started = true;
            self.addressed = None;
        }

        fn generate_stop(&mut self) {
            self.stops += 1;
            self.started = false;
        }

        fn send_address(&mut self, address: u8, read: bool) {
            self.addressed = Some((address, read));
            if self.target != Some(address) {
                self.ack_failure = true;
            }
        }

        fn send_data(&mut self, byte: u8) {
            self.sent.push(byte);
        }

        fn receive_data(&mut self) -> u8 {
            self.acks.push(self.ack_enabled);
            self.rx.pop_front().unwrap_or(0xFF)
        }

        fn set_ack(&mut self, enabled: bool) {
            self.ack_enabled = enabled;
        }

        fn check_event(&self, event: I2cEvent) -> bool {
            self.polls.set(self.polls.get() + 1);
            match event {
                I2cEvent::MasterModeSelect => self.started && !self.hung,
                I2cEvent::TransmitterModeSelected => {
                    self.target_selected() && matches!(self.addressed, Some((_, false)))
                }
                I2cEvent::ReceiverModeSelected => {
                    self.target_selected() && matches!(self.addressed, Some((_, true)))
                }
                I2cEvent::ByteTransmitted => self.target_selected(),
            }
        }

        fn flag(&self, flag: I2cFlag) -> bool {
            match flag {
                I2cFlag::Busy => self.started,
                I2cFlag::TxEmpty => true,
                I2cFlag::RxNotEmpty => !self.rx.is_empty(),
                I2cFlag::AckFailure => self.ack_failure,
            }
        }

        fn clear_flag(&mut self, flag: I2cFlag) {
            if flag == I2cFlag::AckFailure {
                self.ack_failure = false;
            }
        }
    }

    #[test]
    fn test_new_programs_frequency() {
        let mut i2c = HardwareI2c::new(MockPeripheral::default(), I2cConfig::FAST);
        assert_eq!(i2c.peripheral().frequency, 400_000);
        i2c.set_speed(100_000);
        assert_eq!(i2c.peripheral().frequency, 100_000);
        assert_eq!(i2c.config(), I2cConfig::STANDARD);
    }

    #[test]
    fn test_write_sends_bytes() {
        let mut i2c = HardwareI2c::new(MockPeripheral::with_target(0x62), I2cConfig::default());
        i2c.write(0x62, &[0x21, 0xB1]).unwrap();
        let periph = i2c.release();
        assert_eq!(periph.sent, [0x21, 0xB1]);
        assert_eq!(periph.starts, 1);
        assert_eq!(periph.stops, 1);
    }

    #[test]
    fn test_read_fills_buffer() {
        let mut periph = MockPeripheral::with_target(0x68);
        periph.rx.extend([0x12, 0x34, 0x56]);
        let mut i2c = HardwareI2c::new(periph, I2cConfig::default());

        let mut buf = [0u8; 3];
        i2c.read(0x68, &mut buf).unwrap();
        assert_eq!(buf, [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_read_nacks_last_byte() {
        let mut periph = MockPeripheral::with_target(0x68);
        periph.rx.extend([0x12, 0x34, 0x56, 0x78]);
        let mut i2c = HardwareI2c::new(periph, I2cConfig::default());

        let mut buf = [0u8; 3];
        i2c.read(0x68, &mut buf).unwrap();
        let mut one = [0u8; 1];
        i2c.read(0x68, &mut one).unwrap();

        let periph = i2c.release();
        assert_eq!(periph.acks, [true, true, false, false]);
        // ACK is re-armed for the next transfer
        assert!(periph.ack_enabled);
    }

    #[test]
    fn test_empty_read_skips_bus() {
        let mut i2c = HardwareI2c::new(MockPeripheral::with_target(0x68), I2cConfig::default());
        i2c.read(0x68, &mut []).unwrap();
        assert_eq!(i2c.peripheral().starts, 0);
        assert_eq!(i2c.peripheral().stops, 0);
    }

    #[test]
    fn test_absent_address_is_nack_with_stop() {
        let mut i2c = HardwareI2c::new(MockPeripheral::with_target(0x68), I2cConfig::default());
        assert_eq!(i2c.write(0x51, &[0x00]), Err(BusError::Nack));
        assert!(!i2c.probe(0x51));
        assert!(i2c.probe(0x68));

        let periph = i2c.release();
        assert_eq!(periph.starts, 3);
        assert_eq!(periph.stops, 3);
        assert!(periph.sent.is_empty());
    }

    #[test]
    fn test_hung_peripheral_times_out() {
        let periph = MockPeripheral {
            hung: true,
            ..MockPeripheral::with_target(0x68)
        };
        let mut i2c = HardwareI2c::new(periph, I2cConfig::default());

        let mut buf = [0u8; 1];
        assert_eq!(i2c.read(0x68, &mut buf), Err(BusError::Timeout));

        let periph = i2c.release();
        assert_eq!(periph.polls.get(), SPIN_LIMIT);
        assert_eq!(periph.stops, 1);
    }

    #[test]
    fn test_missing_rx_data_times_out() {
        let mut i2c = HardwareI2c::new(MockPeripheral::with_target(0x68), I2cConfig::default());
        let mut buf = [0u8; 2];
        assert_eq!(i2c.read(0x68, &mut buf), Err(BusError::Timeout));
        assert_eq!(i2c.peripheral().stops, 1);
    }
}
