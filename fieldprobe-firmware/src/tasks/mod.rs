//! Embassy async tasks
//!
//! Each task runs independently and communicates via signals.

pub mod buttons;
pub mod controller;

pub use buttons::{button_task, ButtonPins};
pub use controller::{controller_task, ProbeBus};
