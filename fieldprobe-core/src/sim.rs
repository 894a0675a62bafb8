//! Simulated open-drain I2C bus
//!
//! [`SimBus`] implements [`GpioPort`] for two wired-AND lines with a set
//! of simulated targets hanging off them. Every pin operation re-evaluates
//! the line levels and feeds the resulting edges to a small target-side
//! protocol decoder, so the software engine can be exercised bit for bit
//! on the host.
//!
//! Pins other than the two bus lines read low and ignore writes.

use embedded_hal::delay::DelayNs;
use fieldprobe_hal::{GpioPort, PinId, PinMode};
use heapless::Vec;

use crate::bus::BitBangI2c;

/// Data line the simulator is wired to by default (PC1)
pub const SIM_SDA: u8 = 0xC1;
/// Clock line the simulator is wired to by default (PC2)
pub const SIM_SCL: u8 = 0xC2;

const DEFAULT_SDA: PinId = match PinId::from_raw(SIM_SDA) {
    Some(pin) => pin,
    None => panic!("invalid SDA encoding"),
};
const DEFAULT_SCL: PinId = match PinId::from_raw(SIM_SCL) {
    Some(pin) => pin,
    None => panic!("invalid SCL encoding"),
};

/// Maximum number of targets on one simulated bus
pub const MAX_TARGETS: usize = 8;
/// Events kept in the trace; later events are dropped
pub const TRACE_CAPACITY: usize = 512;
/// Master ACK/NACK answers kept
pub const ACK_CAPACITY: usize = 64;

/// Bus condition observed by the targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    Stop,
    /// SCL rising edge with the SDA level at that moment
    Bit(bool),
}

/// Register-file target with an auto-incrementing pointer
///
/// The first byte written after addressing sets the pointer. Further
/// written bytes land in consecutive registers, reads come from
/// consecutive registers.
#[derive(Debug, Clone)]
pub struct RegisterDevice {
    address: u8,
    registers: [u8; 256],
    read_only: [bool; 256],
    pointer: u8,
    expect_pointer: bool,
    ack_data: bool,
}

impl RegisterDevice {
    /// Zeroed device at `address`
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; 256],
            read_only: [false; 256],
            pointer: 0,
            expect_pointer: false,
            ack_data: true,
        }
    }

    /// Preload a register
    pub fn with(mut self, register: u8, value: u8) -> Self {
        self.set(register, value);
        self
    }

    /// Make writes to `register` ACK but change nothing
    pub fn read_only(mut self, register: u8) -> Self {
        self.read_only[register as usize] = true;
        self
    }

    /// ACK the address but NACK every data byte
    pub fn nack_data(mut self) -> Self {
        self.ack_data = false;
        self
    }

    pub fn set(&mut self, register: u8, value: u8) {
        self.registers[register as usize] = value;
    }

    pub fn get(&self, register: u8) -> u8 {
        self.registers[register as usize]
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

/// Something attached to the simulated bus
#[derive(Debug, Clone)]
pub enum SimTarget {
    /// A device with registers
    Registers(RegisterDevice),
    /// Junk that ACKs every address in `first..=last` and nothing else
    ///
    /// Models a floating or shorted bus. Data bytes are NACKed and reads
    /// return 0xFF.
    Spurious { first: u8, last: u8 },
}

impl SimTarget {
    fn acknowledges(&self, address: u8) -> bool {
        match self {
            SimTarget::Registers(dev) => dev.address == address,
            SimTarget::Spurious { first, last } => (*first..=*last).contains(&address),
        }
    }

    fn begin(&mut self, read: bool) {
        if let SimTarget::Registers(dev) = self {
            if !read {
                dev.expect_pointer = true;
            }
        }
    }

    fn receive(&mut self, byte: u8) -> bool {
        match self {
            SimTarget::Registers(dev) => {
                if !dev.ack_data {
                    return false;
                }
                if dev.expect_pointer {
                    dev.pointer = byte;
                    dev.expect_pointer = false;
                } else {
                    let reg = dev.pointer as usize;
                    if !dev.read_only[reg] {
                        dev.registers[reg] = byte;
                    }
                    dev.pointer = dev.pointer.wrapping_add(1);
                }
                true
            }
            SimTarget::Spurious { .. } => false,
        }
    }

    fn transmit(&mut self) -> u8 {
        match self {
            SimTarget::Registers(dev) => {
                let value = dev.registers[dev.pointer as usize];
                dev.pointer = dev.pointer.wrapping_add(1);
                value
            }
            SimTarget::Spurious { .. } => 0xFF,
        }
    }
}

/// Target-side decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoder {
    Idle,
    Address { bits: u8, value: u8 },
    AddressAck { read: bool },
    Receive { bits: u8, value: u8 },
    ReceiveAck,
    Transmit { bits: u8, byte: u8 },
    MasterAck,
    /// Not addressed, waiting for START/STOP
    Ignore,
}

/// Two open-drain lines shared by the master and simulated targets
pub struct SimBus {
    sda: PinId,
    scl: PinId,
    sda_mode: PinMode,
    scl_mode: PinMode,
    sda_latch: bool,
    scl_latch: bool,
    target_holds_sda: bool,
    last_sda: bool,
    last_scl: bool,
    decoder: Decoder,
    active: Option<usize>,
    master_ack: bool,
    targets: Vec<SimTarget, MAX_TARGETS>,
    trace: Vec<BusEvent, TRACE_CAPACITY>,
    master_acks: Vec<bool, ACK_CAPACITY>,
    starts: usize,
    stops: usize,
}

impl SimBus {
    /// Empty bus on [`SIM_SDA`]/[`SIM_SCL`]
    pub fn new() -> Self {
        Self::on_pins(DEFAULT_SDA, DEFAULT_SCL)
    }

    /// Empty bus on arbitrary lines
    pub fn on_pins(sda: PinId, scl: PinId) -> Self {
        Self {
            sda,
            scl,
            sda_mode: PinMode::Input,
            scl_mode: PinMode::Input,
            sda_latch: false,
            scl_latch: false,
            target_holds_sda: false,
            last_sda: true,
            last_scl: true,
            decoder: Decoder::Idle,
            active: None,
            master_ack: false,
            targets: Vec::new(),
            trace: Vec::new(),
            master_acks: Vec::new(),
            starts: 0,
            stops: 0,
        }
    }

    /// Hang a target on the bus
    ///
    /// Returns its index, or `None` if the bus is full.
    pub fn attach(&mut self, target: SimTarget) -> Option<usize> {
        self.targets.push(target).ok()?;
        Some(self.targets.len() - 1)
    }

    /// Register device at `address`, if one is attached
    pub fn device(&self, address: u8) -> Option<&RegisterDevice> {
        self.targets.iter().find_map(|t| match t {
            SimTarget::Registers(dev) if dev.address == address => Some(dev),
            _ => None,
        })
    }

    pub fn trace(&self) -> &[BusEvent] {
        &self.trace
    }

    /// Drop recorded events, ACKs and counters
    pub fn clear_trace(&mut self) {
        self.trace.clear();
        self.master_acks.clear();
        self.starts = 0;
        self.stops = 0;
    }

    /// ACK (true) or NACK (false) answers the master gave to read bytes
    pub fn master_acks(&self) -> &[bool] {
        &self.master_acks
    }

    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn stops(&self) -> usize {
        self.stops
    }

    /// Both lines high
    pub fn is_idle(&self) -> bool {
        self.sda_level() && self.scl_level()
    }

    fn master_pulls(mode: PinMode, latch: bool) -> bool {
        mode.is_output() && !latch
    }

    fn sda_level(&self) -> bool {
        !(Self::master_pulls(self.sda_mode, self.sda_latch) || self.target_holds_sda)
    }

    fn scl_level(&self) -> bool {
        !Self::master_pulls(self.scl_mode, self.scl_latch)
    }

    fn record(&mut self, event: BusEvent) {
        let _ = self.trace.push(event);
    }

    /// Re-evaluate line levels after a master pin change
    fn settle(&mut self) {
        let sda = self.sda_level();
        let scl = self.scl_level();

        if scl != self.last_scl {
            self.last_scl = scl;
            if scl {
                self.clock_rise(sda);
            } else {
                self.clock_fall();
            }
        } else if scl && sda != self.last_sda {
            if sda {
                self.on_stop();
            } else {
                self.on_start();
            }
        }

        // Target changes only happen with SCL low
        self.last_sda = self.sda_level();
    }

    fn on_start(&mut self) {
        self.starts += 1;
        self.record(BusEvent::Start);
        self.target_holds_sda = false;
        self.active = None;
        self.decoder = Decoder::Address { bits: 0, value: 0 };
    }

    fn on_stop(&mut self) {
        self.stops += 1;
        self.record(BusEvent::Stop);
        self.target_holds_sda = false;
        self.active = None;
        self.decoder = Decoder::Idle;
    }

    fn clock_rise(&mut self, sda: bool) {
        self.record(BusEvent::Bit(sda));
        match self.decoder {
            Decoder::Address { bits, value } => {
                self.decoder = Decoder::Address {
                    bits: bits + 1,
                    value: (value << 1) | sda as u8,
                };
            }
            Decoder::Receive { bits, value } => {
                self.decoder = Decoder::Receive {
                    bits: bits + 1,
                    value: (value << 1) | sda as u8,
                };
            }
            Decoder::MasterAck => {
                self.master_ack = !sda;
                let _ = self.master_acks.push(!sda);
            }
            _ => {}
        }
    }

    fn clock_fall(&mut self) {
        match self.decoder {
            Decoder::Address { bits: 8, value } => {
                let address = value >> 1;
                let read = value & 1 == 1;
                match self.targets.iter().position(|t| t.acknowledges(address)) {
                    Some(index) => {
                        self.targets[index].begin(read);
                        self.active = Some(index);
                        self.target_holds_sda = true;
                        self.decoder = Decoder::AddressAck { read };
                    }
                    None => self.decoder = Decoder::Ignore,
                }
            }
            Decoder::AddressAck { read } => {
                self.target_holds_sda = false;
                if read {
                    self.begin_transmit();
                } else {
                    self.decoder = Decoder::Receive { bits: 0, value: 0 };
                }
            }
            Decoder::Receive { bits: 8, value } => {
                let ack = match self.active {
                    Some(index) => self.targets[index].receive(value),
                    None => false,
                };
                self.target_holds_sda = ack;
                self.decoder = Decoder::ReceiveAck;
            }
            Decoder::ReceiveAck => {
                self.target_holds_sda = false;
                self.decoder = Decoder::Receive { bits: 0, value: 0 };
            }
            Decoder::Transmit { bits, byte } => {
                let bits = bits + 1;
                if bits == 8 {
                    self.target_holds_sda = false;
                    self.decoder = Decoder::MasterAck;
                } else {
                    self.target_holds_sda = byte & (0x80 >> bits) == 0;
                    self.decoder = Decoder::Transmit { bits, byte };
                }
            }
            Decoder::MasterAck => {
                if self.master_ack {
                    self.begin_transmit();
                } else {
                    self.target_holds_sda = false;
                    self.decoder = Decoder::Ignore;
                }
            }
            _ => {}
        }
    }

    fn begin_transmit(&mut self) {
        let byte = match self.active {
            Some(index) => self.targets[index].transmit(),
            None => 0xFF,
        };
        self.target_holds_sda = byte & 0x80 == 0;
        self.decoder = Decoder::Transmit { bits: 0, byte };
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for SimBus {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        if pin == self.sda {
            self.sda_mode = mode;
        } else if pin == self.scl {
            self.scl_mode = mode;
        } else {
            return;
        }
        self.settle();
    }

    fn read(&self, pin: PinId) -> bool {
        if pin == self.sda {
            self.sda_level()
        } else if pin == self.scl {
            self.scl_level()
        } else {
            false
        }
    }

    fn write(&mut self, pin: PinId, high: bool) {
        if pin == self.sda {
            self.sda_latch = high;
        } else if pin == self.scl {
            self.scl_latch = high;
        } else {
            return;
        }
        self.settle();
    }
}

/// Delay provider that only counts
#[derive(Debug, Default, Clone, Copy)]
pub struct SimDelay {
    elapsed_ns: u64,
}

impl SimDelay {
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
    }
}

/// Software engine wired to the lines of a simulated bus
pub fn sim_engine(bus: SimBus, speed_hz: u32) -> BitBangI2c<SimBus, SimDelay> {
    let (sda, scl) = (bus.sda, bus.scl);
    BitBangI2c::new(bus, SimDelay::default(), sda, scl, speed_hz)
}
