//! `embedded-hal` 1.0 blocking I2C for the software engine
//!
//! Lets off-the-shelf sensor drivers run on the bit-banged bus. The
//! contract follows `embedded_hal::i2c::I2c::transaction`: one START, a
//! repeated START whenever the direction changes, NACK on the last byte
//! of each read run, one STOP at the end. Empty reads are skipped: a
//! read START with nothing clocked would leave the target holding SDA.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use fieldprobe_hal::GpioPort;

use super::bitbang::BitBangI2c;
use super::error::BusError;

impl<G: GpioPort, D: DelayNs> ErrorType for BitBangI2c<G, D> {
    type Error = BusError;
}

impl<G: GpioPort, D: DelayNs> I2c<SevenBitAddress> for BitBangI2c<G, D> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), BusError> {
        if operations.is_empty() {
            return Ok(());
        }
        let result = run_operations(self, address, operations);
        if self.is_busy() {
            self.stop();
        }
        result
    }
}

fn is_read(op: &Operation<'_>) -> bool {
    matches!(op, Operation::Read(_))
}

fn is_empty_read(op: &Operation<'_>) -> bool {
    matches!(op, Operation::Read(buf) if buf.is_empty())
}

fn run_operations<G: GpioPort, D: DelayNs>(
    bus: &mut BitBangI2c<G, D>,
    address: u8,
    operations: &mut [Operation<'_>],
) -> Result<(), BusError> {
    let mut direction: Option<bool> = None;

    for i in 0..operations.len() {
        if is_empty_read(&operations[i]) {
            continue;
        }
        let read = is_read(&operations[i]);
        let acked = match direction {
            None => bus.start(address, read),
            Some(prev) if prev != read => bus.repeated_start(address, read),
            Some(_) => true,
        };
        if !acked {
            return Err(BusError::Nack);
        }
        direction = Some(read);

        // The read run ends here unless another non-empty read follows
        let run_ends = !operations[i + 1..]
            .iter()
            .find(|op| !is_empty_read(op))
            .map(is_read)
            .unwrap_or(false);

        match &mut operations[i] {
            Operation::Write(bytes) => {
                for &byte in bytes.iter() {
                    if !bus.write_byte(byte) {
                        return Err(BusError::Nack);
                    }
                }
            }
            Operation::Read(buf) => {
                let len = buf.len();
                for (j, slot) in buf.iter_mut().enumerate() {
                    *slot = bus.read_byte(run_ends && j + 1 == len);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{sim_engine, BusEvent, RegisterDevice, SimBus, SimTarget};

    const ADDR: u8 = 0x68;

    fn engine() -> BitBangI2c<SimBus, crate::sim::SimDelay> {
        let mut bus = SimBus::new();
        bus.attach(SimTarget::Registers(
            RegisterDevice::new(ADDR)
                .with(0x00, 0x30)
                .with(0x01, 0x59)
                .with(0x02, 0x23),
        ));
        sim_engine(bus, 400_000)
    }

    #[test]
    fn test_write_read_uses_repeated_start() {
        let mut i2c = engine();
        let mut buf = [0u8; 3];
        I2c::write_read(&mut i2c, ADDR, &[0x00], &mut buf).unwrap();

        assert_eq!(buf, [0x30, 0x59, 0x23]);
        assert_eq!(i2c.gpio().starts(), 2);
        assert_eq!(i2c.gpio().stops(), 1);
        assert_eq!(i2c.gpio().master_acks(), &[true, true, false]);
        assert!(i2c.gpio().is_idle());
    }

    #[test]
    fn test_split_reads_ack_until_last() {
        let mut i2c = engine();
        let mut a = [0u8; 1];
        let mut b = [0u8; 2];
        I2c::transaction(
            &mut i2c,
            ADDR,
            &mut [
                Operation::Write(&[0x00]),
                Operation::Read(&mut a),
                Operation::Read(&mut b),
            ],
        )
        .unwrap();

        assert_eq!(a, [0x30]);
        assert_eq!(b, [0x59, 0x23]);
        assert_eq!(i2c.gpio().master_acks(), &[true, true, false]);
    }

    #[test]
    fn test_empty_read_is_skipped() {
        let mut i2c = engine();
        I2c::write_read(&mut i2c, ADDR, &[0x00], &mut []).unwrap();

        assert_eq!(i2c.gpio().starts(), 1);
        assert_eq!(i2c.gpio().stops(), 1);
        assert!(i2c.gpio().is_idle());

        // The next transaction sees a clean bus
        i2c.gpio_mut().clear_trace();
        assert!(i2c.probe(ADDR));
        assert_eq!(i2c.gpio().starts(), 1);
        assert_eq!(i2c.gpio().stops(), 1);
        assert_eq!(i2c.gpio().trace().first(), Some(&BusEvent::Start));
    }

    #[test]
    fn test_trailing_empty_read_still_nacks() {
        let mut i2c = engine();
        let mut a = [0u8; 1];
        I2c::transaction(
            &mut i2c,
            ADDR,
            &mut [
                Operation::Write(&[0x01]),
                Operation::Read(&mut a),
                Operation::Read(&mut []),
            ],
        )
        .unwrap();

        assert_eq!(a, [0x59]);
        assert_eq!(i2c.gpio().master_acks(), &[false]);
        assert!(i2c.gpio().is_idle());
    }

    #[test]
    fn test_only_empty_reads_touch_nothing() {
        let mut i2c = engine();
        I2c::transaction(&mut i2c, ADDR, &mut [Operation::Read(&mut [])]).unwrap();
        assert_eq!(i2c.gpio().starts(), 0);
        assert_eq!(i2c.gpio().stops(), 0);
        assert!(i2c.gpio().trace().is_empty());
    }

    #[test]
    fn test_eh_write() {
        let mut i2c = engine();
        I2c::write(&mut i2c, ADDR, &[0x05, 0x12]).unwrap();
        assert_eq!(i2c.gpio().device(ADDR).map(|d| d.get(0x05)), Some(0x12));
        assert_eq!(i2c.gpio().starts(), 1);
    }

    #[test]
    fn test_eh_nack_still_stops() {
        let mut i2c = engine();
        let mut buf = [0u8; 1];
        assert_eq!(I2c::read(&mut i2c, 0x10, &mut buf), Err(BusError::Nack));
        assert_eq!(i2c.gpio().stops(), 1);
        assert!(!i2c.is_busy());
    }
}
