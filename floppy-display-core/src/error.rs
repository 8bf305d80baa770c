//! Error types
//!
//! Bus faults and stalls are recovered inside the refresh engine and never
//! reach the caller; only initialisation failures are reported.

use core::fmt;

/// Failure of a synchronous bus operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Wait bound exceeded; the bus is presumed dead for this session
    Timeout,
    /// Controller reported an error condition (NACK, arbitration, ...)
    Fault,
}

/// Failure of `initialize`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Lines read low against the internal pull-downs: floating or driven
    InvalidBus,
    /// Nothing acknowledged in either probe range
    NoDeviceFound,
    /// A bus operation failed
    Bus(BusError),
}

/// Error taxonomy used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Synchronous wait timed out
    BusTimeout,
    /// Controller-reported error
    BusFault,
    /// Watchdog expired with a transfer in flight
    TransferStall,
    /// Detector exhausted both ranges
    NoDeviceFound,
    /// Floating-bus check failed
    InvalidBus,
}

impl From<BusError> for InitError {
    fn from(e: BusError) -> Self {
        InitError::Bus(e)
    }
}

impl From<BusError> for ErrorKind {
    fn from(e: BusError) -> Self {
        match e {
            BusError::Timeout => ErrorKind::BusTimeout,
            BusError::Fault => ErrorKind::BusFault,
        }
    }
}

impl InitError {
    /// Map into the diagnostic taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            InitError::InvalidBus => ErrorKind::InvalidBus,
            InitError::NoDeviceFound => ErrorKind::NoDeviceFound,
            InitError::Bus(e) => (*e).into(),
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Timeout => f.write_str("bus locked up"),
            BusError::Fault => f.write_str("bus fault"),
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::InvalidBus => f.write_str("invalid bus"),
            InitError::NoDeviceFound => f.write_str("no device found"),
            InitError::Bus(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::BusTimeout => "bus timeout",
            ErrorKind::BusFault => "bus fault",
            ErrorKind::TransferStall => "transfer stall",
            ErrorKind::NoDeviceFound => "no device found",
            ErrorKind::InvalidBus => "invalid bus",
        };
        f.write_str(s)
    }
}
