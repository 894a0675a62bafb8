//! Identification rules
//!
//! Several supported parts share bus addresses with parts we do not
//! support, so an ACK alone says little. Each rule checks one register
//! signature; the first rule that matches decides.

use crate::bus::RegisterIo;

use super::kind::DeviceKind;

/// LTR390 fixed address
pub const LTR390_ADDRESS: u8 = 0x53;
/// LTR390 part ID register and expected value
pub const LTR390_PART_ID: (u8, u8) = (0x06, 0xB2);

/// SCD4x fixed address
pub const SCD4X_ADDRESS: u8 = 0x62;

/// DS3231 address (shared with many IMUs and other RTCs)
pub const DS3231_ADDRESS: u8 = 0x68;
/// DS3231 temperature LSB; only the top two bits are ever set
pub const DS3231_TEMP_LSB: u8 = 0x12;

/// RV3032 address (shared with PCF8563)
pub const RV3032_ADDRESS: u8 = 0x51;
/// RV3032 temperature high threshold, writable scratch on this part only
pub const RV3032_TEMP_HIGH: u8 = 0x17;
pub const RV3032_PATTERN: u8 = 0x55;

/// LSM6DS3 WHO_AM_I register and expected value
pub const LSM6DS3_WHO_AM_I: (u8, u8) = (0x0F, 0x69);

/// A single identification rule
///
/// Returns `Some` only on a positive match. Bus failures are no match.
pub type Rule = fn(&mut dyn RegisterIo, u8) -> Option<DeviceKind>;

/// Rules in evaluation order
pub const RULES: &[Rule] = &[ltr390, scd4x, ds3231, rv3032, lsm6ds3];

fn ltr390(bus: &mut dyn RegisterIo, address: u8) -> Option<DeviceKind> {
    if address != LTR390_ADDRESS {
        return None;
    }
    let (reg, id) = LTR390_PART_ID;
    (bus.read_u8(address, reg)? == id).then_some(DeviceKind::Ltr390)
}

fn scd4x(_bus: &mut dyn RegisterIo, address: u8) -> Option<DeviceKind> {
    (address == SCD4X_ADDRESS).then_some(DeviceKind::Scd4x)
}

fn ds3231(bus: &mut dyn RegisterIo, address: u8) -> Option<DeviceKind> {
    if address != DS3231_ADDRESS {
        return None;
    }
    let lsb = bus.read_u8(address, DS3231_TEMP_LSB)?;
    (lsb & 0x3F == 0).then_some(DeviceKind::Ds3231)
}

/// Writes a test pattern into the threshold register.
///
/// On a PCF8563 at the same address register 0x17 does not exist; the
/// write is harmless there but does alter RV3032 alarm configuration.
fn rv3032(bus: &mut dyn RegisterIo, address: u8) -> Option<DeviceKind> {
    if address != RV3032_ADDRESS {
        return None;
    }
    if !bus.write_bytes(address, &[RV3032_TEMP_HIGH, RV3032_PATTERN]) {
        return None;
    }
    (bus.read_u8(address, RV3032_TEMP_HIGH)? == RV3032_PATTERN).then_some(DeviceKind::Rv3032)
}

fn lsm6ds3(bus: &mut dyn RegisterIo, address: u8) -> Option<DeviceKind> {
    let (reg, id) = LSM6DS3_WHO_AM_I;
    (bus.read_u8(address, reg)? == id).then_some(DeviceKind::Lsm6ds3)
}
