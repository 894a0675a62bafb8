//! Bus scanner
//!
//! Walks the address window, probes each address, identifies responders
//! and reports whether a supported sensor was found.

pub mod events;
pub mod machine;
pub mod scanner;

pub use events::ScanEvent;
pub use machine::ScanState;
pub use scanner::{ProbeResponse, ScanOutcome, ScanStep, Scanner, MAX_RECORDS};
