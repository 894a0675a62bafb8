//! Known device kinds

/// Sensor families the harness can recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceKind {
    /// Responded, but matched no rule
    Unknown,
    /// LTR390 UV/ambient light sensor
    Ltr390,
    /// SCD40/SCD41 CO2 sensor
    Scd4x,
    /// LSM6DS3 accelerometer/gyroscope
    Lsm6ds3,
    /// RV-3032 real-time clock
    Rv3032,
    /// DS3231 real-time clock
    Ds3231,
}

impl DeviceKind {
    /// Human-readable part name
    pub const fn name(self) -> &'static str {
        match self {
            DeviceKind::Unknown => "Unknown",
            DeviceKind::Ltr390 => "LTR390",
            DeviceKind::Scd4x => "SCD4x",
            DeviceKind::Lsm6ds3 => "LSM6DS3",
            DeviceKind::Rv3032 => "RV3032",
            DeviceKind::Ds3231 => "DS3231",
        }
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, DeviceKind::Unknown)
    }
}

/// One responding address and what it turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceRecord {
    /// 7-bit bus address
    pub address: u8,
    pub kind: DeviceKind,
}

impl DeviceRecord {
    pub const fn new(address: u8, kind: DeviceKind) -> Self {
        Self { address, kind }
    }
}
