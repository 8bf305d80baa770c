//! Status display driver for floppy-drive emulator firmware
//!
//! Drives a 16x2 text display over a shared I2C bus without ever blocking
//! the foreground: an HD44780 character LCD behind a PCF8574 backpack, or an
//! SSD1306 OLED that renders the same 16x2 grid from a glyph table.
//!
//! - Bus recovery and controller auto-detection at power-on
//! - DMA-driven continuous refresh from interrupt context
//! - Transfer watchdog and automatic reinitialisation after bus faults
//! - Interrupt-safe text buffer shared with the foreground
//!
//! # Wiring it up
//!
//! ```text
//!  foreground                      interrupt context (one shared priority)
//! ┌──────────────┐  write/sync   ┌─────────┐   ┌───────────────────────┐
//! │ emulator UI  │──────────────▶│ Display │◀──│ RefreshEngine         │
//! └──────────────┘               └─────────┘   │  on_bus_event()       │
//!                                              │  on_dma_complete()    │
//!                                              │  on_bus_error()       │
//!                                              └───────────────────────┘
//! ```
//!
//! The board keeps the [`RefreshEngine`] in a static cell and calls its
//! handlers from the I2C event, I2C error and DMA completion vectors. The
//! [`Display`] is a separate static shared by both sides.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

// Must come first: the logging macros are used by every other module.
#[macro_use]
mod fmt;

pub mod bus;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod font;
pub mod frame;
pub mod text;
pub mod watchdog;

#[cfg(test)]
mod testing;

pub use config::{AddressRange, DriverConfig, OledPanel};
pub use display::{Display, PowerOn};
pub use engine::{Controller, DriverMode, EngineState, EngineStats, RefreshEngine};
pub use error::{BusError, ErrorKind, InitError};
pub use font::GlyphFont;
pub use text::{TextBuffer, COLUMNS, ROWS};
