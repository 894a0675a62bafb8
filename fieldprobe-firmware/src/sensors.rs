//! Per-sensor sample loops
//!
//! Once the scanner settles on a device the controller reads one fixed
//! block from it every period. Samples are logged raw.

use embedded_hal::delay::DelayNs;
use heapless::Deque;

use fieldprobe_core::bus::read_register;
use fieldprobe_core::identify::DeviceKind;
use fieldprobe_hal::I2cBus;

/// Largest block any plan reads
pub const MAX_SAMPLE_LEN: usize = 9;

/// LTR390 samples kept for the rolling maximum
pub const UV_WINDOW: usize = 32;

/// How a sample is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Register pointer write then read
    Register(u8),
    /// Command write, 1 ms pause, then read
    Command(&'static [u8]),
}

/// What to read from a device and how often
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePlan {
    /// Written once before sampling starts
    pub setup: Option<&'static [u8]>,
    pub request: Request,
    pub len: usize,
    /// Zero samples as fast as the bus allows
    pub period_ms: u64,
}

/// Sample plan for a device kind
pub fn plan_for(kind: DeviceKind) -> Option<SamplePlan> {
    let plan = match kind {
        // UVS mode, active
        DeviceKind::Ltr390 => SamplePlan {
            setup: Some(&[0x00, 0x0A]),
            request: Request::Register(0x10),
            len: 3,
            period_ms: 100,
        },
        DeviceKind::Ds3231 => SamplePlan {
            setup: None,
            request: Request::Register(0x00),
            len: 7,
            period_ms: 1000,
        },
        DeviceKind::Rv3032 => SamplePlan {
            setup: None,
            request: Request::Register(0x01),
            len: 7,
            period_ms: 1000,
        },
        // Accelerometer 208 Hz, 2 g
        DeviceKind::Lsm6ds3 => SamplePlan {
            setup: Some(&[0x10, 0x50]),
            request: Request::Register(0x28),
            len: 6,
            period_ms: 0,
        },
        // start_periodic_measurement, then read_measurement
        DeviceKind::Scd4x => SamplePlan {
            setup: Some(&[0x21, 0xB1]),
            request: Request::Command(&[0xEC, 0x05]),
            len: 9,
            period_ms: 5000,
        },
        DeviceKind::Unknown => return None,
    };
    Some(plan)
}

/// Send the plan's setup write, if any
pub fn prepare<B: I2cBus>(bus: &mut B, address: u8, plan: &SamplePlan) -> Result<(), B::Error> {
    match plan.setup {
        Some(setup) => bus.write(address, setup),
        None => Ok(()),
    }
}

/// Take one sample into `buf`, returning the filled part
pub fn sample<'a, B: I2cBus, D: DelayNs>(
    bus: &mut B,
    delay: &mut D,
    address: u8,
    plan: &SamplePlan,
    buf: &'a mut [u8; MAX_SAMPLE_LEN],
) -> Result<&'a [u8], B::Error> {
    let data = &mut buf[..plan.len];
    match plan.request {
        Request::Register(register) => read_register(bus, address, register, data)?,
        Request::Command(command) => {
            bus.write(address, command)?;
            delay.delay_ms(1);
            bus.read(address, data)?;
        }
    }
    Ok(data)
}

/// 20-bit LTR390 UV count from its three data registers
pub fn uv_count(data: &[u8]) -> u32 {
    match data {
        [lo, mid, hi, ..] => u32::from(*lo) | u32::from(*mid) << 8 | u32::from(*hi & 0x0F) << 16,
        _ => 0,
    }
}

/// Maximum over the last `N` values
pub struct RollingMax<const N: usize> {
    window: Deque<u32, N>,
}

impl<const N: usize> Default for RollingMax<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RollingMax<N> {
    pub const fn new() -> Self {
        Self {
            window: Deque::new(),
        }
    }

    /// Add a value and return the current maximum
    pub fn push(&mut self, value: u32) -> u32 {
        if self.window.is_full() {
            self.window.pop_front();
        }
        // Cannot fail: room was made above
        let _ = self.window.push_back(value);
        self.max()
    }

    pub fn max(&self) -> u32 {
        self.window.iter().copied().max().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
