//! I2C master engines
//!
//! Two engines implement [`fieldprobe_hal::I2cBus`]:
//!
//! - [`BitBangI2c`] toggles two GPIO lines in software and works on any
//!   pin pair
//! - [`HardwareI2c`] drives an on-chip peripheral with bounded waits
//!
//! Everything above this module (identification, scanning, sampling)
//! only sees `I2cBus`.

pub mod bitbang;
mod eh;
pub mod error;
pub mod hardware;
pub mod register;
pub mod timing;

pub use bitbang::BitBangI2c;
pub use error::BusError;
pub use hardware::{HardwareI2c, SPIN_LIMIT};
pub use register::{read_register, read_register_u8, write_register, RegisterIo};
pub use timing::BitDelay;
