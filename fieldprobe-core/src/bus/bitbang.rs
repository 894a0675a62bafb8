//! Bit-banged I2C master
//!
//! Drives SDA and SCL as emulated open-drain lines: a line is released
//! (pulled high externally) by switching its pin to input, and pulled
//! low by switching it to output with the latch at 0. The master never
//! drives a line high, so a target holding SDA low is always visible.
//!
//! No clock stretching, no arbitration. Single master, polling only.

use embedded_hal::delay::DelayNs;
use fieldprobe_hal::{GpioPort, I2cBus, PinId, PinMode};

use super::error::BusError;
use super::timing::BitDelay;

/// Software I2C master over two GPIO lines
///
/// Owns the GPIO port and the delay provider for its whole lifetime, so
/// there is exactly one caller touching the lines.
pub struct BitBangI2c<G, D> {
    gpio: G,
    delay: D,
    sda: PinId,
    scl: PinId,
    bit_delay: BitDelay,
    /// Between START and STOP
    busy: bool,
}

impl<G: GpioPort, D: DelayNs> BitBangI2c<G, D> {
    /// Create an engine on the given lines
    ///
    /// # Arguments
    /// * `gpio` - Port owning both lines
    /// * `delay` - Microsecond busy-wait provider
    /// * `sda` - Data line
    /// * `scl` - Clock line
    /// * `speed_hz` - Target bus speed, mapped to a [`BitDelay`] tier
    pub fn new(gpio: G, delay: D, sda: PinId, scl: PinId, speed_hz: u32) -> Self {
        Self {
            gpio,
            delay,
            sda,
            scl,
            bit_delay: BitDelay::for_speed(speed_hz),
            busy: false,
        }
    }

    /// Re-initialize pins and speed
    pub fn configure(&mut self, sda: PinId, scl: PinId, speed_hz: u32) {
        self.sda = sda;
        self.scl = scl;
        self.set_speed(speed_hz);
    }

    /// Change only the speed tier
    pub fn set_speed(&mut self, speed_hz: u32) {
        self.bit_delay = BitDelay::for_speed(speed_hz);
    }

    /// Current delay tier
    pub fn bit_delay(&self) -> BitDelay {
        self.bit_delay
    }

    /// Check if a transaction is open (START issued, no STOP yet)
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Data line
    pub fn sda(&self) -> PinId {
        self.sda
    }

    /// Clock line
    pub fn scl(&self) -> PinId {
        self.scl
    }

    /// Borrow the GPIO port
    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Mutably borrow the GPIO port
    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    /// Consume the engine and hand back its resources
    pub fn release(self) -> (G, D) {
        (self.gpio, self.delay)
    }

    fn sda_release(&mut self) {
        self.gpio.set_mode(self.sda, PinMode::Input);
    }

    fn sda_low(&mut self) {
        self.gpio.set_mode(self.sda, PinMode::Output);
        self.gpio.write(self.sda, false);
    }

    fn scl_release(&mut self) {
        self.gpio.set_mode(self.scl, PinMode::Input);
    }

    fn scl_low(&mut self) {
        self.gpio.set_mode(self.scl, PinMode::Output);
        self.gpio.write(self.scl, false);
    }

    fn sda_is_high(&self) -> bool {
        self.gpio.read(self.sda)
    }

    fn wait(&mut self) {
        self.delay.delay_us(self.bit_delay.micros());
    }

    /// Issue START and send the address byte
    ///
    /// Assumes an idle bus (both lines high). Returns true if the address
    /// was acknowledged. The bus is left open either way; the caller
    /// must follow up with [`stop`](Self::stop).
    pub fn start(&mut self, address: u8, read: bool) -> bool {
        self.busy = true;
        self.sda_low();
        self.wait();
        self.scl_low();
        self.write_byte(((address & 0x7F) << 1) | read as u8)
    }

    /// Issue STOP and release both lines
    ///
    /// Does not look at the previous bus state.
    pub fn stop(&mut self) {
        self.sda_low();
        self.wait();
        self.scl_release();
        self.wait();
        self.sda_release();
        self.wait();
        self.busy = false;
    }

    /// Release both lines from mid-transaction and START again
    pub(crate) fn repeated_start(&mut self, address: u8, read: bool) -> bool {
        self.sda_release();
        self.wait();
        self.scl_release();
        self.wait();
        self.start(address, read)
    }

    /// Clock out one byte MSB-first and sample the ACK bit
    ///
    /// Returns true if the target pulled SDA low during the ninth clock.
    pub fn write_byte(&mut self, byte: u8) -> bool {
        let mut b = byte;
        for _ in 0..8 {
            if b & 0x80 != 0 {
                self.sda_release();
            } else {
                self.sda_low();
            }
            b <<= 1;
            self.scl_release();
            self.wait();
            self.scl_low();
            self.wait();
        }

        // ACK bit comes from the target
        self.sda_release();
        self.scl_release();
        self.wait();
        let nack = self.sda_is_high();
        self.scl_low();
        self.wait();
        self.sda_low();

        !nack
    }

    /// Clock in one byte MSB-first and answer it
    ///
    /// `last` sends NACK (SDA released) to end the read; otherwise ACK.
    pub fn read_byte(&mut self, last: bool) -> u8 {
        let mut value = 0u8;

        self.sda_release();
        for _ in 0..8 {
            self.wait();
            self.scl_release();
            self.wait();
            value <<= 1;
            if self.sda_is_high() {
                value |= 1;
            }
            self.scl_low();
        }

        if last {
            self.sda_release();
        } else {
            self.sda_low();
        }
        self.scl_release();
        self.wait();
        self.scl_low();
        self.wait();
        self.sda_low();

        value
    }

    /// Run `body` inside START/STOP
    ///
    /// STOP is issued exactly once whatever `body` returns. An address
    /// NACK skips `body`.
    fn framed<R>(
        &mut self,
        address: u8,
        read: bool,
        body: impl FnOnce(&mut Self) -> Result<R, BusError>,
    ) -> Result<R, BusError> {
        let result = if self.start(address, read) {
            body(self)
        } else {
            Err(BusError::Nack)
        };
        self.stop();
        result
    }

    /// Write `bytes` to the device at `address`
    ///
    /// Stops sending at the first NACK. The number of bytes that made it
    /// onto the bus is not reported.
    pub fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        self.framed(address, false, |bus| {
            for &byte in bytes {
                if !bus.write_byte(byte) {
                    return Err(BusError::Nack);
                }
            }
            Ok(())
        })
    }

    /// Read `buf.len()` bytes from the device at `address`
    ///
    /// The final byte is NACKed to tell the target the read is over.
    pub fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        if buf.is_empty() {
            return Ok(());
        }
        self.framed(address, true, |bus| {
            let last = buf.len() - 1;
            for (i, slot) in buf.iter_mut().enumerate() {
                *slot = bus.read_byte(i == last);
            }
            Ok(())
        })
    }

    /// Write then read as two transactions
    pub fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), BusError> {
        self.write(address, write)?;
        self.read(address, read)
    }

    /// Address-only write transaction
    ///
    /// Returns true if `address` acknowledged.
    pub fn probe(&mut self, address: u8) -> bool {
        let ack = self.start(address, false);
        self.stop();
        ack
    }
}

impl<G: GpioPort, D: DelayNs> I2cBus for BitBangI2c<G, D> {
    type Error = BusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        BitBangI2c::write(self, address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        BitBangI2c::read(self, address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), BusError> {
        BitBangI2c::write_read(self, address, write_data, read_buf)
    }

    fn probe(&mut self, address: u8) -> bool {
        BitBangI2c::probe(self, address)
    }
}
