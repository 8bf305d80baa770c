//! I2C transport
//!
//! Synchronous primitives (start, byte write, probe) used during
//! initialisation, plus the pieces of the asynchronous path that the
//! refresh engine drives from interrupt context: opening a transaction whose
//! address phase is handled by the event interrupt, and closing one once the
//! DMA has drained.
//!
//! Every wait is bounded. A wait that runs out marks the bus dead, which is
//! how a physically stuck bus is told apart from a slow peer.

pub mod detect;
pub mod recovery;

use embassy_time::{Duration, Instant};
use floppy_display_hal::{I2cController, I2cStatus};

use crate::error::BusError;

/// Bounded-wait wrapper around an I2C controller
pub struct Transport<I> {
    i2c: I,
    timeout: Duration,
    alive: bool,
}

impl<I: I2cController> Transport<I> {
    /// Wrap a controller; `timeout` bounds every synchronous wait
    pub fn new(i2c: I, timeout: Duration) -> Self {
        Self {
            i2c,
            timeout,
            alive: true,
        }
    }

    /// False once any wait has timed out
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Clear the dead-bus flag ahead of a fresh initialisation
    pub fn revive(&mut self) {
        self.alive = true;
    }

    /// Direct access to the controller
    pub fn controller(&mut self) -> &mut I {
        &mut self.i2c
    }

    /// Wait until every flag in `flags` is set
    ///
    /// Error flags abort the wait and are cleared.
    pub fn wait_for(&mut self, flags: I2cStatus) -> Result<(), BusError> {
        self.poll(flags, true)
    }

    fn poll(&mut self, flags: I2cStatus, clear_errors: bool) -> Result<(), BusError> {
        let start = Instant::now();
        loop {
            let sr = self.i2c.status();
            if sr.contains(flags) {
                return Ok(());
            }
            if sr.has_errors() {
                if clear_errors {
                    self.i2c.clear_errors();
                }
                return Err(BusError::Fault);
            }
            if start.elapsed() > self.timeout {
                self.alive = false;
                return Err(BusError::Timeout);
            }
        }
    }

    /// Generate a start condition and address `address` for writing
    pub fn start(&mut self, address: u8) -> Result<(), BusError> {
        self.i2c.request_start();
        self.wait_for(I2cStatus::START_SENT)?;
        self.i2c.write_data(address << 1);
        self.wait_for(I2cStatus::ADDRESS_ACKED)?;
        self.i2c.acknowledge_address();
        Ok(())
    }

    /// Write one byte and wait for it to leave the shift register
    pub fn send_byte(&mut self, value: u8) -> Result<(), BusError> {
        self.i2c.write_data(value);
        self.wait_for(I2cStatus::BYTE_TRANSFERRED)
    }

    /// Generate a stop condition and wait for the controller to finish it
    pub fn stop(&mut self) -> Result<(), BusError> {
        self.i2c.request_stop();
        let start = Instant::now();
        while self.i2c.stop_pending() {
            if start.elapsed() > self.timeout {
                self.alive = false;
                return Err(BusError::Timeout);
            }
        }
        Ok(())
    }

    /// Check whether a device acknowledges at `address`
    ///
    /// Writes a single zero byte, which PCF8574 and SSD1306 parts both
    /// accept harmlessly.
    pub fn probe(&mut self, address: u8) -> bool {
        if self.start(address).is_err() || self.send_byte(0).is_err() {
            return false;
        }
        self.stop().is_ok()
    }

    /// Clock one nibble into an HD44780 through the expander, synchronously
    pub fn write_nibble(&mut self, value: u8) -> Result<(), BusError> {
        for byte in crate::frame::hd44780::nibble_writes(value) {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    /// Start a transaction whose address phase runs from the event interrupt
    pub fn open_async(&mut self) {
        self.i2c.set_event_interrupt(true);
        self.i2c.request_start();
    }

    /// Event interrupt body for an asynchronous transaction
    ///
    /// Sends the address after the start condition; once it is acknowledged
    /// the event interrupt is switched off and DMA takes over the data phase.
    pub fn on_event(&mut self, address: u8) {
        let sr = self.i2c.status();
        if sr.contains(I2cStatus::START_SENT) {
            self.i2c.write_data(address << 1);
        }
        if sr.contains(I2cStatus::ADDRESS_ACKED) {
            self.i2c.acknowledge_address();
            self.i2c.set_event_interrupt(false);
        }
    }

    /// End the current transaction once the last DMA byte has shifted out
    ///
    /// Error flags are left set for the error interrupt to classify.
    pub fn close(&mut self) -> Result<(), BusError> {
        self.poll(I2cStatus::BYTE_TRANSFERRED, false)?;
        self.stop()
    }
}
