//! Address-window scanner
//!
//! [`Scanner`] owns the scan state machine and the per-pass bookkeeping.
//! It borrows the bus only for the duration of a [`Scanner::step`], so the
//! caller can do other work (blink an LED, check buttons) between probes.

use fieldprobe_hal::I2cBus;
use heapless::Vec;

use crate::config::ScanConfig;
use crate::identify::{identify, DeviceKind, DeviceRecord};

use super::events::ScanEvent;
use super::machine::ScanState;

/// Responding addresses kept per pass
pub const MAX_RECORDS: usize = 16;

/// How a finished pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanOutcome {
    /// A supported device answered
    Found(DeviceRecord),
    /// Window exhausted, nothing supported answered
    NoSensors,
    /// Too many reserved addresses answered; the bus is likely open or shorted
    BusFault,
}

/// What one probe saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeResponse {
    /// No ACK
    Silent,
    /// ACK from an address below the valid range
    Reserved,
    /// ACK from a valid address, with the identification result
    Device(DeviceKind),
}

/// Result of a single [`Scanner::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanStep {
    pub address: u8,
    pub response: ProbeResponse,
    /// Set on the step that ends the pass
    pub outcome: Option<ScanOutcome>,
}

/// Bus scanner
pub struct Scanner {
    config: ScanConfig,
    state: ScanState,
    next_address: u8,
    bad_count: u8,
    records: Vec<DeviceRecord, MAX_RECORDS>,
    outcome: Option<ScanOutcome>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            state: ScanState::Idle,
            next_address: config.first_address,
            bad_count: 0,
            records: Vec::new(),
            outcome: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Responding valid addresses of the current or last pass
    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// Outcome of the last finished pass
    pub fn outcome(&self) -> Option<ScanOutcome> {
        self.outcome
    }

    /// Reserved-range ACKs seen in this pass
    pub fn bad_count(&self) -> u8 {
        self.bad_count
    }

    /// Address the next step will probe
    pub fn next_address(&self) -> u8 {
        self.next_address
    }

    /// Feed an event to the state machine
    ///
    /// Entering `Scanning` resets the pass.
    pub fn handle(&mut self, event: ScanEvent) -> ScanState {
        let next = self.state.transition(event);
        if next == ScanState::Scanning && self.state != ScanState::Scanning {
            self.reset_pass();
        }
        self.state = next;
        next
    }

    /// Leave `Idle`
    pub fn start(&mut self) -> ScanState {
        self.handle(ScanEvent::Start)
    }

    /// Begin another pass after `Found` or `Exhausted`
    pub fn restart(&mut self) -> ScanState {
        self.handle(ScanEvent::Restart)
    }

    fn reset_pass(&mut self) {
        self.next_address = self.config.first_address;
        self.bad_count = 0;
        self.records.clear();
        self.outcome = None;
    }

    fn finish(&mut self, event: ScanEvent, outcome: ScanOutcome) -> Option<ScanOutcome> {
        self.handle(event);
        self.outcome = Some(outcome);
        self.outcome
    }

    /// Probe one address
    ///
    /// Returns `None` unless the scanner is in `Scanning`.
    pub fn step<B: I2cBus>(&mut self, bus: &mut B) -> Option<ScanStep> {
        if self.state != ScanState::Scanning {
            return None;
        }

        let address = self.next_address;
        let response = if !bus.probe(address) {
            ProbeResponse::Silent
        } else if address < self.config.min_valid_address {
            self.bad_count = self.bad_count.saturating_add(1);
            ProbeResponse::Reserved
        } else {
            let kind = identify(bus, address);
            // Records past capacity are dropped; the scan itself goes on
            let _ = self.records.push(DeviceRecord::new(address, kind));
            ProbeResponse::Device(kind)
        };

        #[cfg(feature = "defmt")]
        match response {
            ProbeResponse::Silent => defmt::trace!("scan {=u8:#x}: silent", address),
            _ => defmt::debug!("scan {=u8:#x}: {}", address, response),
        }

        let outcome = if self.bad_count >= self.config.bus_fault_threshold {
            self.finish(ScanEvent::BusFaultDetected, ScanOutcome::BusFault)
        } else if let Some(kind) = response.known_device() {
            self.finish(
                ScanEvent::DeviceIdentified,
                ScanOutcome::Found(DeviceRecord::new(address, kind)),
            )
        } else if address >= self.config.last_address {
            self.finish(ScanEvent::RangeExhausted, ScanOutcome::NoSensors)
        } else {
            self.next_address = address + 1;
            None
        };

        Some(ScanStep {
            address,
            response,
            outcome,
        })
    }

    /// Run a complete pass
    ///
    /// Starts from `Idle` or restarts from a terminal state, then steps
    /// until the pass ends.
    pub fn run<B: I2cBus>(&mut self, bus: &mut B) -> ScanOutcome {
        match self.state {
            ScanState::Idle => {
                self.start();
            }
            ScanState::Found | ScanState::Exhausted => {
                self.restart();
            }
            ScanState::Scanning => {}
        }

        while let Some(step) = self.step(bus) {
            if let Some(outcome) = step.outcome {
                return outcome;
            }
        }

        // step() only stops returning steps after setting an outcome
        self.outcome.unwrap_or(ScanOutcome::NoSensors)
    }
}

impl ProbeResponse {
    /// Kind of a supported device, if this response identified one
    pub fn known_device(self) -> Option<DeviceKind> {
        match self {
            ProbeResponse::Device(kind) if kind.is_known() => Some(kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{sim_engine, RegisterDevice, SimBus, SimTarget};
    use proptest::prelude::*;

    fn engine(targets: &[SimTarget]) -> crate::bus::BitBangI2c<SimBus, crate::sim::SimDelay> {
        let mut bus = SimBus::new();
        for target in targets {
            bus.attach(target.clone());
        }
        sim_engine(bus, 100_000)
    }

    fn registers(device: RegisterDevice) -> SimTarget {
        SimTarget::Registers(device)
    }

    #[test]
    fn test_new_scanner_is_idle() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[]);
        assert_eq!(scanner.state(), ScanState::Idle);
        assert_eq!(scanner.step(&mut i2c), None);
        assert_eq!(i2c.gpio().starts(), 0);
    }

    #[test]
    fn test_empty_bus_is_no_sensors() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[]);

        assert_eq!(scanner.run(&mut i2c), ScanOutcome::NoSensors);
        assert_eq!(scanner.state(), ScanState::Exhausted);
        assert!(scanner.records().is_empty());
        // 0x04..=0x7F
        assert_eq!(i2c.gpio().starts(), 124);
        assert_eq!(i2c.gpio().stops(), 124);
    }

    #[test]
    fn test_known_device_filters_unknown() {
        let ltr390 = ProbeResponse::Device(DeviceKind::Ltr390);
        assert_eq!(ltr390.known_device(), Some(DeviceKind::Ltr390));
        assert_eq!(ProbeResponse::Device(DeviceKind::Unknown).known_device(), None);
        assert_eq!(ProbeResponse::Reserved.known_device(), None);
        assert_eq!(ProbeResponse::Silent.known_device(), None);
    }

    #[test]
    fn test_ltr390_found() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[registers(RegisterDevice::new(0x53).with(0x06, 0xB2))]);

        let expected = DeviceRecord::new(0x53, DeviceKind::Ltr390);
        assert_eq!(scanner.run(&mut i2c), ScanOutcome::Found(expected));
        assert_eq!(scanner.state(), ScanState::Found);
        assert_eq!(scanner.records(), &[expected]);
        assert_eq!(i2c.gpio().starts(), i2c.gpio().stops());
    }

    #[test]
    fn test_unrecognized_device_does_not_stop_scan() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[
            registers(RegisterDevice::new(0x53).with(0x06, 0x12)),
            registers(RegisterDevice::new(0x62)),
        ]);

        let outcome = scanner.run(&mut i2c);
        assert_eq!(
            outcome,
            ScanOutcome::Found(DeviceRecord::new(0x62, DeviceKind::Scd4x))
        );
        assert_eq!(
            scanner.records(),
            &[
                DeviceRecord::new(0x53, DeviceKind::Unknown),
                DeviceRecord::new(0x62, DeviceKind::Scd4x),
            ]
        );
    }

    #[test]
    fn test_unknown_only_is_no_sensors() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[registers(RegisterDevice::new(0x3C))]);

        assert_eq!(scanner.run(&mut i2c), ScanOutcome::NoSensors);
        assert_eq!(
            scanner.records(),
            &[DeviceRecord::new(0x3C, DeviceKind::Unknown)]
        );
    }

    #[test]
    fn test_reserved_acks_trip_bus_fault() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[SimTarget::Spurious {
            first: 0x04,
            last: 0x0F,
        }]);

        let mut last = None;
        while let Some(step) = scanner.step(&mut i2c) {
            last = Some(step);
        }
        assert_eq!(last, None, "scanner must be started first");

        scanner.start();
        let mut steps = 0;
        while let Some(step) = scanner.step(&mut i2c) {
            steps += 1;
            assert_eq!(step.response, ProbeResponse::Reserved);
            last = Some(step);
        }

        // Tenth bad ACK lands on 0x0D
        assert_eq!(steps, 10);
        let last = last.unwrap();
        assert_eq!(last.address, 0x0D);
        assert_eq!(last.outcome, Some(ScanOutcome::BusFault));
        assert_eq!(scanner.state(), ScanState::Exhausted);
        assert_eq!(scanner.bad_count(), 10);
    }

    #[test]
    fn test_few_reserved_acks_are_tolerated() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[
            SimTarget::Spurious {
                first: 0x08,
                last: 0x0B,
            },
            registers(RegisterDevice::new(0x68).with(0x12, 0x40)),
        ]);

        assert_eq!(
            scanner.run(&mut i2c),
            ScanOutcome::Found(DeviceRecord::new(0x68, DeviceKind::Ds3231))
        );
        assert_eq!(scanner.bad_count(), 4);
    }

    #[test]
    fn test_restart_resets_pass() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[registers(RegisterDevice::new(0x62))]);

        assert!(matches!(scanner.run(&mut i2c), ScanOutcome::Found(_)));
        assert_eq!(scanner.records().len(), 1);

        assert_eq!(scanner.restart(), ScanState::Scanning);
        assert!(scanner.records().is_empty());
        assert_eq!(scanner.outcome(), None);
        assert_eq!(scanner.next_address(), 0x04);

        assert!(matches!(scanner.run(&mut i2c), ScanOutcome::Found(_)));
    }

    #[test]
    fn test_found_ignores_further_steps() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut i2c = engine(&[registers(RegisterDevice::new(0x62))]);
        scanner.run(&mut i2c);

        let probes = i2c.gpio().starts();
        assert_eq!(scanner.step(&mut i2c), None);
        assert_eq!(i2c.gpio().starts(), probes);
    }

    #[test]
    fn test_custom_window() {
        let config = ScanConfig {
            first_address: 0x50,
            last_address: 0x52,
            ..ScanConfig::default()
        };
        let mut scanner = Scanner::new(config);
        let mut i2c = engine(&[registers(RegisterDevice::new(0x62))]);

        assert_eq!(scanner.run(&mut i2c), ScanOutcome::NoSensors);
        assert_eq!(i2c.gpio().starts(), 3);
    }

    #[test]
    fn test_records_capped() {
        let mut scanner = Scanner::new(ScanConfig::default());
        let mut bus = SimBus::new();
        // 32 unidentifiable responders in the valid range
        bus.attach(SimTarget::Spurious {
            first: 0x20,
            last: 0x3F,
        });
        let mut i2c = sim_engine(bus, 100_000);

        assert_eq!(scanner.run(&mut i2c), ScanOutcome::NoSensors);
        assert_eq!(scanner.records().len(), MAX_RECORDS);
        assert_eq!(scanner.records()[0].address, 0x20);
    }

    proptest! {
        #[test]
        fn single_scd4x_found_wherever_window_allows(first in 0x04u8..0x62) {
            let config = ScanConfig { first_address: first, ..ScanConfig::default() };
            let mut scanner = Scanner::new(config);
            let mut i2c = engine(&[registers(RegisterDevice::new(0x62))]);

            let outcome = scanner.run(&mut i2c);
            let scd4x = DeviceRecord::new(0x62, DeviceKind::Scd4x);
            prop_assert_eq!(outcome, ScanOutcome::Found(scd4x));
            prop_assert_eq!(i2c.gpio().starts(), (0x62 - first) as usize + 1);
            prop_assert_eq!(i2c.gpio().starts(), i2c.gpio().stops());
        }
    }
}
