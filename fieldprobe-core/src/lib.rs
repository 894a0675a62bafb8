//! Board-agnostic core logic for the Fieldprobe sensor harness
//!
//! This crate contains everything that does not depend on a specific
//! microcontroller:
//!
//! - Bit-banged I2C master engine over the `fieldprobe-hal` GPIO traits
//! - Hardware-assisted I2C engine with bounded event waits
//! - Register-level helpers used by sensor drivers
//! - Device identification for sensors sharing bus addresses
//! - Bus scanner state machine
//! - Configuration type definitions
//! - A simulated open-drain bus for host tests (`sim` feature)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod config;
pub mod identify;
pub mod scan;

#[cfg(any(test, feature = "sim"))]
pub mod sim;
