//! I2C controller abstractions
//!
//! The display driver talks to the controller at the level of individual
//! bus conditions (start, address, data byte, stop) because it interleaves
//! synchronous probing with DMA-driven data phases. Status is reported as a
//! flag word laid out like a typical SR1 register.

use core::ops::{BitAnd, BitOr, BitOrAssign};

/// Snapshot of the controller status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cStatus(pub u16);

impl I2cStatus {
    /// No flags set
    pub const NONE: Self = Self(0);
    /// Start condition generated
    pub const START_SENT: Self = Self(1 << 0);
    /// Address sent and acknowledged
    pub const ADDRESS_ACKED: Self = Self(1 << 1);
    /// Byte transfer finished (shift register empty)
    pub const BYTE_TRANSFERRED: Self = Self(1 << 2);
    /// Data register empty
    pub const TX_EMPTY: Self = Self(1 << 7);
    /// Misplaced start or stop detected
    pub const BUS_ERROR: Self = Self(1 << 8);
    /// Arbitration lost
    pub const ARBITRATION_LOST: Self = Self(1 << 9);
    /// Peer did not acknowledge
    pub const ACK_FAILURE: Self = Self(1 << 10);
    /// Overrun or underrun
    pub const OVERRUN: Self = Self(1 << 11);
    /// PEC error in reception
    pub const PEC_ERROR: Self = Self(1 << 12);
    /// Clock stretched beyond the SMBus limit
    pub const TIMEOUT: Self = Self(1 << 14);
    /// SMBus alert
    pub const SMB_ALERT: Self = Self(1 << 15);

    /// Every error flag
    pub const ERRORS: Self = Self(
        Self::BUS_ERROR.0
            | Self::ARBITRATION_LOST.0
            | Self::ACK_FAILURE.0
            | Self::OVERRUN.0
            | Self::PEC_ERROR.0
            | Self::TIMEOUT.0
            | Self::SMB_ALERT.0,
    );

    /// Raw flag bits
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True if every flag in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if any error flag is set
    pub const fn has_errors(self) -> bool {
        self.intersects(Self::ERRORS)
    }

    /// Only the error flags
    pub const fn errors(self) -> Self {
        Self(self.0 & Self::ERRORS.0)
    }
}

impl BitOr for I2cStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for I2cStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for I2cStatus {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Bus clock speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cSpeed {
    /// Standard mode (100 kHz)
    Standard,
    /// Fast mode (400 kHz)
    Fast,
}

impl I2cSpeed {
    /// Clock frequency in Hz
    pub const fn frequency(self) -> u32 {
        match self {
            I2cSpeed::Standard => 100_000,
            I2cSpeed::Fast => 400_000,
        }
    }
}

/// I2C bus master controller
///
/// Methods map one-to-one onto controller operations; none of them wait.
/// Waiting on [`status`](I2cController::status) is the caller's job.
pub trait I2cController {
    /// Gate the controller's clock on or off
    fn set_powered(&mut self, on: bool);

    /// Disable the controller, program timing for `speed` and re-enable it
    ///
    /// Interrupt and DMA request enables are cleared.
    fn configure(&mut self, speed: I2cSpeed);

    /// Disable the controller (pins stay in their current mode)
    fn disable(&mut self);

    /// Put the controller through a software reset
    fn reset(&mut self);

    /// Read the status flags
    fn status(&self) -> I2cStatus;

    /// Clear all error flags, returning the ones that were set
    fn clear_errors(&mut self) -> I2cStatus;

    /// Request a start condition
    fn request_start(&mut self);

    /// Request a stop condition
    fn request_stop(&mut self);

    /// True while a requested stop has not yet been generated
    fn stop_pending(&self) -> bool;

    /// Write the data register (address byte or payload byte)
    fn write_data(&mut self, byte: u8);

    /// Clear the address-acknowledged flag (SR2 read on most parts)
    fn acknowledge_address(&mut self);

    /// Enable or disable the event interrupt
    fn set_event_interrupt(&mut self, on: bool);

    /// Enable or disable the error interrupt
    fn set_error_interrupt(&mut self, on: bool);

    /// Enable or disable DMA requests for the data register
    fn set_dma_requests(&mut self, on: bool);
}
