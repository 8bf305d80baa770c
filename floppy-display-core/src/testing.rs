//! Simulated display board for host tests
//!
//! All mock peripherals share one [`SimState`], so a test can inject faults
//! (stuck bus, peer holding SDA, missing device) and then inspect what the
//! driver did to the lines, the controller and the DMA channel.

use core::cell::{RefCell, RefMut};
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::{Duration, MockDriver};
use floppy_display_hal::{
    AlarmTimer, Board, BusPin, DelayNs, DmaChannel, I2cController, I2cSpeed, I2cStatus, Irq,
    IrqControl, Peripherals, PinMode,
};

/// Simulated time consumed by one status register read
const POLL_COST: Duration = Duration::from_micros(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Scl,
    Sda,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    High,
    Low,
    Mode(PinMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Start,
    Addressed,
    Data,
}

pub struct SimState {
    // I2C controller and the devices behind it
    pub devices: Vec<u8>,
    pub stuck: bool,
    pub hold_btf: bool,
    pub flags: I2cStatus,
    pub phase: Phase,
    pub powered: bool,
    pub enabled: bool,
    pub configures: Vec<I2cSpeed>,
    pub resets: u32,
    pub event_irq: bool,
    pub error_irq: bool,
    pub dma_requests: bool,
    pub start_requests: u32,
    pub address_attempts: Vec<u8>,
    pub acked_addresses: Vec<u8>,
    pub bus_bytes: Vec<u8>,
    pub stops: u32,

    // DMA
    pub transfers: Vec<Vec<u8>>,
    pub dma_active: bool,
    pub dma_stops: u32,

    // Bus lines, indexed by `Line`
    pub modes: [PinMode; 2],
    pub driven_low: [bool; 2],
    pub pin_log: Vec<(Line, PinEvent)>,
    pub sda_held_by_peer: bool,
    pub sda_shorted: bool,
    pub floating: bool,

    // Interrupt controller, indexed by `Irq`
    pub irq_enabled: [bool; 3],
    pub irq_priority: [Option<u8>; 3],
    pub irq_pending: [bool; 3],

    pub alarm: Option<Duration>,
    pub alarm_arms: u32,
    pub delays_us: Vec<u32>,
}

impl SimState {
    pub fn irq_enabled(&self, irq: Irq) -> bool {
        self.irq_enabled[irq as usize]
    }
}

/// Handle to the shared simulation
#[derive(Clone)]
pub struct Sim(Rc<RefCell<SimState>>);

impl Sim {
    /// Idle, pulled-up bus with devices acknowledging at `addresses`
    pub fn with_devices(addresses: &[u8]) -> Self {
        Self(Rc::new(RefCell::new(SimState {
            devices: addresses.to_vec(),
            stuck: false,
            hold_btf: false,
            flags: I2cStatus::NONE,
            phase: Phase::Idle,
            powered: false,
            enabled: false,
            configures: Vec::new(),
            resets: 0,
            event_irq: false,
            error_irq: false,
            dma_requests: false,
            start_requests: 0,
            address_attempts: Vec::new(),
            acked_addresses: Vec::new(),
            bus_bytes: Vec::new(),
            stops: 0,
            transfers: Vec::new(),
            dma_active: false,
            dma_stops: 0,
            modes: [PinMode::PullUpInput; 2],
            driven_low: [false; 2],
            pin_log: Vec::new(),
            sda_held_by_peer: false,
            sda_shorted: false,
            floating: false,
            irq_enabled: [false; 3],
            irq_priority: [None; 3],
            irq_pending: [false; 3],
            alarm: None,
            alarm_arms: 0,
            delays_us: Vec::new(),
        })))
    }

    pub fn state(&self) -> RefMut<'_, SimState> {
        self.0.borrow_mut()
    }

    pub fn i2c(&self) -> MockI2c {
        MockI2c(self.clone())
    }

    pub fn dma(&self) -> MockDma {
        MockDma(self.clone())
    }

    pub fn scl(&self) -> MockPin {
        MockPin {
            sim: self.clone(),
            line: Line::Scl,
        }
    }

    pub fn sda(&self) -> MockPin {
        MockPin {
            sim: self.clone(),
            line: Line::Sda,
        }
    }

    pub fn irq(&self) -> MockIrq {
        MockIrq(self.clone())
    }

    pub fn alarm(&self) -> MockAlarm {
        MockAlarm(self.clone())
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay(self.clone())
    }

    pub fn peripherals(&self) -> Peripherals<MockBoard> {
        Peripherals {
            i2c: self.i2c(),
            dma: self.dma(),
            scl: self.scl(),
            sda: self.sda(),
            irq: self.irq(),
            alarm: self.alarm(),
            delay: self.delay(),
        }
    }
}

pub struct MockBoard;

impl Board for MockBoard {
    type I2c = MockI2c;
    type Dma = MockDma;
    type Scl = MockPin;
    type Sda = MockPin;
    type Irq = MockIrq;
    type Alarm = MockAlarm;
    type Delay = MockDelay;
}

pub struct MockI2c(Sim);

impl I2cController for MockI2c {
    fn set_powered(&mut self, on: bool) {
        self.0.state().powered = on;
    }

    fn configure(&mut self, speed: I2cSpeed) {
        let mut s = self.0.state();
        s.configures.push(speed);
        s.enabled = true;
        s.event_irq = false;
        s.error_irq = false;
        s.dma_requests = false;
    }

    fn disable(&mut self) {
        self.0.state().enabled = false;
    }

    fn reset(&mut self) {
        let mut s = self.0.state();
        s.resets += 1;
        s.enabled = false;
        s.phase = Phase::Idle;
        s.flags = I2cStatus::NONE;
        s.event_irq = false;
        s.error_irq = false;
        s.dma_requests = false;
    }

    fn status(&self) -> I2cStatus {
        MockDriver::get().advance(POLL_COST);
        let s = self.0.state();
        let mut sr = s.flags;
        if s.phase == Phase::Data && !s.stuck {
            sr |= I2cStatus::TX_EMPTY;
            if !s.hold_btf {
                sr |= I2cStatus::BYTE_TRANSFERRED;
            }
        }
        sr
    }

    fn clear_errors(&mut self) -> I2cStatus {
        let mut s = self.0.state();
        let errors = s.flags.errors();
        s.flags = I2cStatus(s.flags.bits() & !I2cStatus::ERRORS.bits());
        errors
    }

    fn request_start(&mut self) {
        let mut s = self.0.state();
        s.start_requests += 1;
        if !s.stuck {
            s.flags |= I2cStatus::START_SENT;
            s.phase = Phase::Start;
        }
    }

    fn request_stop(&mut self) {
        let mut s = self.0.state();
        s.stops += 1;
        s.phase = Phase::Idle;
    }

    fn stop_pending(&self) -> bool {
        false
    }

    fn write_data(&mut self, byte: u8) {
        let mut s = self.0.state();
        match s.phase {
            Phase::Start => {
                let address = byte >> 1;
                s.flags = I2cStatus(s.flags.bits() & !I2cStatus::START_SENT.bits());
                s.address_attempts.push(address);
                if s.devices.contains(&address) {
                    s.acked_addresses.push(address);
                    s.flags |= I2cStatus::ADDRESS_ACKED;
                    s.phase = Phase::Addressed;
                } else {
                    s.flags |= I2cStatus::ACK_FAILURE;
                    s.phase = Phase::Idle;
                }
            }
            Phase::Data => s.bus_bytes.push(byte),
            Phase::Idle | Phase::Addressed => {}
        }
    }

    fn acknowledge_address(&mut self) {
        let mut s = self.0.state();
        s.flags = I2cStatus(s.flags.bits() & !I2cStatus::ADDRESS_ACKED.bits());
        s.phase = Phase::Data;
    }

    fn set_event_interrupt(&mut self, on: bool) {
        self.0.state().event_irq = on;
    }

    fn set_error_interrupt(&mut self, on: bool) {
        self.0.state().error_irq = on;
    }

    fn set_dma_requests(&mut self, on: bool) {
        self.0.state().dma_requests = on;
    }
}

pub struct MockDma(Sim);

impl DmaChannel for MockDma {
    fn start(&mut self, data: &[u8]) {
        let mut s = self.0.state();
        s.transfers.push(data.to_vec());
        s.dma_active = true;
    }

    fn stop(&mut self) {
        let mut s = self.0.state();
        s.dma_active = false;
        s.dma_stops += 1;
    }
}

pub struct MockPin {
    sim: Sim,
    line: Line,
}

impl BusPin for MockPin {
    fn set_mode(&mut self, mode: PinMode) {
        let mut s = self.sim.state();
        s.modes[self.line as usize] = mode;
        s.pin_log.push((self.line, PinEvent::Mode(mode)));
    }

    fn set_high(&mut self) {
        let mut s = self.sim.state();
        s.driven_low[self.line as usize] = false;
        s.pin_log.push((self.line, PinEvent::High));
    }

    fn set_low(&mut self) {
        let mut s = self.sim.state();
        s.driven_low[self.line as usize] = true;
        s.pin_log.push((self.line, PinEvent::Low));
        // A clock pulse completes the peer's acknowledge cycle
        if self.line == Line::Scl {
            s.sda_held_by_peer = false;
        }
    }

    fn is_high(&self) -> bool {
        let s = self.sim.state();
        let i = self.line as usize;
        if s.driven_low[i] && s.modes[i] == PinMode::OpenDrainOutput {
            return false;
        }
        if self.line == Line::Sda && (s.sda_shorted || s.sda_held_by_peer) {
            return false;
        }
        !(s.floating && s.modes[i] == PinMode::PullDownInput)
    }
}

pub struct MockIrq(Sim);

impl IrqControl for MockIrq {
    fn set_priority(&mut self, irq: Irq, priority: u8) {
        self.0.state().irq_priority[irq as usize] = Some(priority);
    }

    fn enable(&mut self, irq: Irq) {
        self.0.state().irq_enabled[irq as usize] = true;
    }

    fn disable(&mut self, irq: Irq) {
        self.0.state().irq_enabled[irq as usize] = false;
    }

    fn clear_pending(&mut self, irq: Irq) {
        self.0.state().irq_pending[irq as usize] = false;
    }

    fn set_pending(&mut self, irq: Irq) {
        self.0.state().irq_pending[irq as usize] = true;
    }
}

pub struct MockAlarm(Sim);

impl AlarmTimer for MockAlarm {
    fn arm(&mut self, after: Duration) {
        let mut s = self.0.state();
        s.alarm = Some(after);
        s.alarm_arms += 1;
    }

    fn cancel(&mut self) {
        self.0.state().alarm = None;
    }
}

pub struct MockDelay(Sim);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.state().delays_us.push(ns / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.0.state().delays_us.push(us);
    }
}
