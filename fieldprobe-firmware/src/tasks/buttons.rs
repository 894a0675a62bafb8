//! Button polling task
//!
//! Polls both buttons every 10 ms, debounces them and signals presses to
//! the controller.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};

use fieldprobe_hal_rp2040::PinConfig;

use crate::channels::{ButtonEvent, BUTTONS};

/// Poll interval
const POLL_MS: u64 = 10;

/// Consecutive active polls before a press counts
const DEBOUNCE_POLLS: u8 = 3;

/// A button input and its polarity
pub struct ButtonPins {
    pub a: Input<'static>,
    pub b: Input<'static>,
    pub a_config: PinConfig,
    pub b_config: PinConfig,
}

/// Integrating debouncer for one button
#[derive(Debug, Default)]
pub struct Debouncer {
    count: u8,
    pressed: bool,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            count: 0,
            pressed: false,
        }
    }

    /// Feed one poll; true on the press edge
    pub fn update(&mut self, active: bool) -> bool {
        if active {
            self.count = (self.count + 1).min(DEBOUNCE_POLLS);
        } else {
            self.count = self.count.saturating_sub(1);
        }

        if self.count == DEBOUNCE_POLLS && !self.pressed {
            self.pressed = true;
            return true;
        }
        if self.count == 0 {
            self.pressed = false;
        }
        false
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Both debouncers together
#[derive(Debug, Default)]
pub struct ButtonState {
    a: Debouncer,
    b: Debouncer,
}

impl ButtonState {
    pub const fn new() -> Self {
        Self {
            a: Debouncer::new(),
            b: Debouncer::new(),
        }
    }

    /// Feed one poll of both buttons
    ///
    /// A press while the other button is held reports [`ButtonEvent::Both`].
    pub fn update(&mut self, a_active: bool, b_active: bool) -> Option<ButtonEvent> {
        let a_edge = self.a.update(a_active);
        let b_edge = self.b.update(b_active);

        if (a_edge && self.b.is_pressed()) || (b_edge && self.a.is_pressed()) {
            Some(ButtonEvent::Both)
        } else if a_edge {
            Some(ButtonEvent::A)
        } else if b_edge {
            Some(ButtonEvent::B)
        } else {
            None
        }
    }
}

/// Button task
#[embassy_executor::task]
pub async fn button_task(pins: ButtonPins) {
    info!("Button task started");

    let mut ticker = Ticker::every(Duration::from_millis(POLL_MS));
    let mut state = ButtonState::new();

    loop {
        let a = pins.a_config.is_active(pins.a.is_high());
        let b = pins.b_config.is_active(pins.b.is_high());

        if let Some(event) = state.update(a, b) {
            debug!("Button: {:?}", event);
            BUTTONS.signal(event);
        }

        ticker.next().await;
    }
}
