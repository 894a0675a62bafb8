//! Fieldprobe Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the bus engines are written
//! against. Chip-specific crates implement them; the simulator in
//! `fieldprobe-core` implements them for host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  fieldprobe-firmware                    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  fieldprobe-core (engines, scanner)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  fieldprobe-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           ┌───────────────────┐
//!           │ fieldprobe-hal-   │
//!           │     rp2040        │
//!           └───────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::GpioPort`] - Pin direction and level by [`gpio::PinId`]
//! - [`i2c::I2cBus`] - Addressed I2C master operations
//! - [`i2c::I2cPeripheral`] - Event-flag view of an on-chip I2C block

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use gpio::{GpioPort, PinId, PinMode, Port};
pub use i2c::{I2cBus, I2cConfig, I2cEvent, I2cFlag, I2cPeripheral};
