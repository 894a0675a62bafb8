//! Device identification
//!
//! Given an address that answered a probe, figure out which supported
//! part sits there.

pub mod kind;
pub mod rules;

pub use kind::{DeviceKind, DeviceRecord};
pub use rules::{Rule, RULES};

use crate::bus::RegisterIo;

/// Run the rules in order against `address`
///
/// Returns [`DeviceKind::Unknown`] when nothing matches.
pub fn identify(bus: &mut dyn RegisterIo, address: u8) -> DeviceKind {
    RULES
        .iter()
        .find_map(|rule| rule(bus, address))
        .unwrap_or(DeviceKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{sim_engine, RegisterDevice, SimBus, SimTarget};

    fn identify_one(device: RegisterDevice) -> DeviceKind {
        let address = device.address();
        let mut bus = SimBus::new();
        bus.attach(SimTarget::Registers(device));
        let mut i2c = sim_engine(bus, 100_000);
        identify(&mut i2c, address)
    }

    #[test]
    fn test_ltr390_part_id() {
        assert_eq!(
            identify_one(RegisterDevice::new(0x53).with(0x06, 0xB2)),
            DeviceKind::Ltr390
        );
        assert_eq!(
            identify_one(RegisterDevice::new(0x53).with(0x06, 0xB3)),
            DeviceKind::Unknown
        );
    }

    #[test]
    fn test_scd4x_by_address() {
        assert_eq!(identify_one(RegisterDevice::new(0x62)), DeviceKind::Scd4x);
    }

    #[test]
    fn test_ds3231_temperature_lsb() {
        assert_eq!(
            identify_one(RegisterDevice::new(0x68).with(0x12, 0xC0)),
            DeviceKind::Ds3231
        );
        // Low bits set: something else at 0x68
        assert_eq!(
            identify_one(RegisterDevice::new(0x68).with(0x12, 0x41)),
            DeviceKind::Unknown
        );
    }

    #[test]
    fn test_lsm6ds3_at_ds3231_address() {
        let device = RegisterDevice::new(0x68).with(0x12, 0x07).with(0x0F, 0x69);
        assert_eq!(identify_one(device), DeviceKind::Lsm6ds3);
    }

    #[test]
    fn test_rv3032_echoes_pattern() {
        assert_eq!(identify_one(RegisterDevice::new(0x51)), DeviceKind::Rv3032);
    }

    #[test]
    fn test_pcf8563_stays_unknown() {
        let device = RegisterDevice::new(0x51).read_only(0x17);
        assert_eq!(identify_one(device), DeviceKind::Unknown);
    }

    #[test]
    fn test_lsm6ds3_anywhere() {
        assert_eq!(
            identify_one(RegisterDevice::new(0x6A).with(0x0F, 0x69)),
            DeviceKind::Lsm6ds3
        );
        assert_eq!(
            identify_one(RegisterDevice::new(0x6A).with(0x0F, 0x6A)),
            DeviceKind::Unknown
        );
    }

    #[test]
    fn test_failed_transfer_is_no_match() {
        // Device NACKs the register pointer write
        let device = RegisterDevice::new(0x53).with(0x06, 0xB2).nack_data();
        assert_eq!(identify_one(device), DeviceKind::Unknown);

        let mut i2c = sim_engine(SimBus::new(), 100_000);
        assert_eq!(identify(&mut i2c, 0x53), DeviceKind::Unknown);
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(RULES.len(), 5);
    }
}
