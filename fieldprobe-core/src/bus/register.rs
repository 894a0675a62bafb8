//! Register-level access on top of [`I2cBus`]

use fieldprobe_hal::I2cBus;

/// Read `buf.len()` bytes starting at `register`
///
/// Writes the register pointer, then reads. Whether that is one
/// transaction or two is up to the engine.
pub fn read_register<B: I2cBus>(
    bus: &mut B,
    address: u8,
    register: u8,
    buf: &mut [u8],
) -> Result<(), B::Error> {
    bus.write_read(address, &[register], buf)
}

/// Read a single register
pub fn read_register_u8<B: I2cBus>(bus: &mut B, address: u8, register: u8) -> Result<u8, B::Error> {
    let mut buf = [0u8; 1];
    read_register(bus, address, register, &mut buf)?;
    Ok(buf[0])
}

/// Write a single register
pub fn write_register<B: I2cBus>(
    bus: &mut B,
    address: u8,
    register: u8,
    value: u8,
) -> Result<(), B::Error> {
    bus.write(address, &[register, value])
}

/// Object-safe register access for identification rules
///
/// Success-or-nothing: identification only cares whether a transfer
/// completed, never why it failed. Implemented for every [`I2cBus`].
pub trait RegisterIo {
    /// Read one register, `None` on any bus failure
    fn read_u8(&mut self, address: u8, register: u8) -> Option<u8>;

    /// Raw write, true if every byte was acknowledged
    fn write_bytes(&mut self, address: u8, data: &[u8]) -> bool;
}

impl<B: I2cBus> RegisterIo for B {
    fn read_u8(&mut self, address: u8, register: u8) -> Option<u8> {
        read_register_u8(self, address, register).ok()
    }

    fn write_bytes(&mut self, address: u8, data: &[u8]) -> bool {
        I2cBus::write(self, address, data).is_ok()
    }
}
