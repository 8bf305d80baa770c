//! Floppy Display Hardware Abstraction Layer
//!
//! This crate defines the hardware capabilities the display driver consumes.
//! A board crate implements them on top of its chip's I2C controller, DMA
//! engine, GPIO block, interrupt controller and a software timer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  floppy-display-core (refresh engine)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  floppy-display-hal (this crate)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  board crate (registers, IRQ vectors)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::BusPin`] - SCL/SDA line control with mode switching
//! - [`i2c::I2cController`] - I2C master primitives and status flags
//! - [`dma::DmaChannel`] - Memory-to-peripheral transfers
//! - [`irq::IrqControl`] - Interrupt controller access
//! - [`timer::AlarmTimer`] - Rearmable single-shot timer
//! - [`Board`] - Bundle of the concrete types a board provides

#![no_std]
#![deny(unsafe_code)]

pub mod dma;
pub mod gpio;
pub mod i2c;
pub mod irq;
pub mod timer;

pub use embedded_hal::delay::DelayNs;

// Re-export key traits at crate root for convenience
pub use dma::DmaChannel;
pub use gpio::{BusPin, PinMode};
pub use i2c::{I2cController, I2cSpeed, I2cStatus};
pub use irq::{Irq, IrqControl};
pub use timer::AlarmTimer;

/// Peripheral types a board hands to the display driver
///
/// Implemented by a zero-sized marker type in the board crate; the driver is
/// generic over it instead of over every peripheral separately.
pub trait Board {
    /// I2C controller wired to the display
    type I2c: I2cController;
    /// DMA channel feeding the I2C data register
    type Dma: DmaChannel;
    /// Clock line
    type Scl: BusPin;
    /// Data line
    type Sda: BusPin;
    /// Interrupt controller
    type Irq: IrqControl;
    /// Transfer watchdog timer
    type Alarm: AlarmTimer;
    /// Microsecond delay source
    type Delay: DelayNs;
}

/// Peripheral instances for one display bus
pub struct Peripherals<B: Board> {
    pub i2c: B::I2c,
    pub dma: B::Dma,
    pub scl: B::Scl,
    pub sda: B::Sda,
    pub irq: B::Irq,
    pub alarm: B::Alarm,
    pub delay: B::Delay,
}
