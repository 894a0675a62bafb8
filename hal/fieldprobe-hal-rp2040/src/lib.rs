//! RP2040-specific HAL for the Fieldprobe sensor harness
//!
//! This crate provides RP2040 implementations of the shared
//! `fieldprobe-hal` traits, plus the board plumbing the firmware needs:
//!
//! - [`port::FlexPort`] - `GpioPort` over bidirectional `Flex` pins
//! - [`pins::PinBank`] - take GPIO pins by number from config
//! - [`gpio`] - pin-string parsing and conflict tracking

#![no_std]

pub mod gpio;
pub mod pins;
pub mod port;

pub use gpio::{parse_pin_string, GpioAllocator, PinConfig};
pub use pins::{PinBank, PinError};
pub use port::{FlexPort, PortError};
