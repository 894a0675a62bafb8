//! Controller task
//!
//! Owns the bus engine and the LED. Waits for the start gesture, scans,
//! and then samples whatever it found until a button asks for a rescan.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_futures::yield_now;
use embassy_rp::gpio::{Level, Output};
use embassy_time::{Delay, Timer};

use fieldprobe_core::bus::BitBangI2c;
use fieldprobe_core::config::ProbeConfig;
use fieldprobe_core::identify::{DeviceKind, DeviceRecord};
use fieldprobe_core::scan::{ProbeResponse, ScanOutcome, ScanState, Scanner};
use fieldprobe_hal_rp2040::FlexPort;

use crate::channels::{ButtonEvent, BUTTONS};
use crate::sensors::{
    plan_for, prepare, sample, uv_count, RollingMax, MAX_SAMPLE_LEN, UV_WINDOW,
};

/// The harness bus: bit-banged over two RP2040 GPIOs
pub type ProbeBus = BitBangI2c<FlexPort<'static>, Delay>;

/// LED blink period while waiting for the start gesture
const IDLE_BLINK_MS: u64 = 250;

/// Controller task
#[embassy_executor::task]
pub async fn controller_task(mut bus: ProbeBus, mut led: Output<'static>, config: ProbeConfig) {
    info!("Controller task started");

    wait_for_start(&mut led).await;

    let mut scanner = Scanner::new(config.scan);
    loop {
        bus.set_speed(config.bus.scan_speed_hz);
        let outcome = scan(&mut scanner, &mut bus, &mut led).await;
        led.set_low();

        match outcome {
            ScanOutcome::Found(record) => {
                info!("Found {} at {=u8:#x}", record.kind.name(), record.address);
                bus.set_speed(config.bus.sensor_speed_hz);
                monitor(&mut bus, record).await;
            }
            ScanOutcome::NoSensors => {
                warn!("No supported sensors ({} responders)", scanner.records().len());
                wait_for_button().await;
            }
            ScanOutcome::BusFault => {
                warn!("Bus fault: {} reserved addresses answered", scanner.bad_count());
                wait_for_button().await;
            }
        }
        info!("Rescanning");
    }
}

/// Blink until both buttons are pressed
async fn wait_for_start(led: &mut Output<'static>) {
    info!("Press both buttons to start scanning");
    BUTTONS.reset();
    loop {
        led.toggle();
        let timeout = Timer::after_millis(IDLE_BLINK_MS);
        if let Either::Second(ButtonEvent::Both) = select(timeout, BUTTONS.wait()).await {
            break;
        }
    }
    led.set_low();
}

async fn wait_for_button() {
    BUTTONS.reset();
    let event = BUTTONS.wait().await;
    debug!("Restart requested by {:?}", event);
}

/// One scanner pass, LED following address parity
async fn scan(
    scanner: &mut Scanner,
    bus: &mut ProbeBus,
    led: &mut Output<'static>,
) -> ScanOutcome {
    match scanner.state() {
        ScanState::Idle => scanner.start(),
        ScanState::Scanning => ScanState::Scanning,
        ScanState::Found | ScanState::Exhausted => scanner.restart(),
    };

    loop {
        let Some(step) = scanner.step(bus) else {
            return scanner.outcome().unwrap_or(ScanOutcome::NoSensors);
        };

        led.set_level(Level::from(step.address & 1 == 1));

        match step.response {
            ProbeResponse::Silent => {}
            ProbeResponse::Reserved => warn!("Reserved address {=u8:#x} answered", step.address),
            ProbeResponse::Device(kind) => info!("{=u8:#x}: {}", step.address, kind.name()),
        }

        if let Some(outcome) = step.outcome {
            return outcome;
        }
        yield_now().await;
    }
}

/// Sample `record` until a button is pressed
async fn monitor(bus: &mut ProbeBus, record: DeviceRecord) {
    let Some(plan) = plan_for(record.kind) else {
        return;
    };
    let address = record.address;

    if let Err(e) = prepare(bus, address, &plan) {
        warn!("{} setup failed: {:?}", record.kind.name(), e);
    }

    let mut delay = Delay;
    let mut buf = [0u8; MAX_SAMPLE_LEN];
    let mut uv_max = RollingMax::<UV_WINDOW>::new();

    BUTTONS.reset();
    loop {
        match sample(bus, &mut delay, address, &plan, &mut buf) {
            Ok(data) if record.kind == DeviceKind::Ltr390 => {
                let uv = uv_count(data);
                info!("UV {} (max {})", uv, uv_max.push(uv));
            }
            Ok(data) => info!("{}: {=[u8]:x}", record.kind.name(), data),
            Err(e) => warn!("{} sample failed: {:?}", record.kind.name(), e),
        }

        let period = Timer::after_millis(plan.period_ms);
        if let Either::Second(event) = select(period, BUTTONS.wait()).await {
            debug!("Monitor stopped by {:?}", event);
            return;
        }
    }
}
