//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware fills these from
//! its embedded TOML file and falls back to [`ProbeConfig::default`].

pub mod types;

pub use types::*;
