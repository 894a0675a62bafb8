//! Fieldprobe - I2C Sensor Harness Firmware
//!
//! Main firmware binary for the RP2040-based field-test harness. Finds the
//! one supported sensor on a bit-banged I2C bus and samples it.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

use fieldprobe_core::bus::BitBangI2c;
use fieldprobe_hal_rp2040::{FlexPort, PinBank, PinConfig};

use crate::config::load_config;

mod channels;
mod config;
mod sensors;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit probe.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../probe.toml");

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Fieldprobe firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config(EMBEDDED_CONFIG);
    let board = config.board;
    let mut pins = PinBank::new(p);

    // Logical bus lines onto their GPIOs
    let mut port = FlexPort::new();
    unwrap!(port.bind(config.probe.bus.sda, unwrap!(pins.take(board.sda.pin))));
    unwrap!(port.bind(config.probe.bus.scl, unwrap!(pins.take(board.scl.pin))));

    let bus = BitBangI2c::new(
        port,
        Delay,
        config.probe.bus.sda,
        config.probe.bus.scl,
        config.probe.bus.scan_speed_hz,
    );
    info!("I2C engine on gpio{} (sda) / gpio{} (scl)", board.sda.pin, board.scl.pin);

    let led = Output::new(unwrap!(pins.take(board.led.pin)), Level::Low);

    let buttons = tasks::ButtonPins {
        a: Input::new(unwrap!(pins.take(board.button_a.pin)), pull_for(board.button_a)),
        b: Input::new(unwrap!(pins.take(board.button_b.pin)), pull_for(board.button_b)),
        a_config: board.button_a,
        b_config: board.button_b,
    };

    unwrap!(spawner.spawn(tasks::button_task(buttons)));
    unwrap!(spawner.spawn(tasks::controller_task(bus, led, config.probe)));

    info!("All tasks spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

fn pull_for(pin: PinConfig) -> Pull {
    if pin.pull_up {
        Pull::Up
    } else {
        Pull::None
    }
}
