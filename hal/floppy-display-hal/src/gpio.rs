//! GPIO abstractions for the bus lines
//!
//! Bus recovery drives SCL and SDA by hand before the I2C controller takes
//! them over, so the pins need runtime mode switching as well as plain
//! level control.

/// Electrical configuration of a bus line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// General-purpose open-drain output (high = released)
    OpenDrainOutput,
    /// Input with the weak internal pull-up enabled
    PullUpInput,
    /// Input with the weak internal pull-down enabled
    PullDownInput,
    /// Open-drain output driven by the I2C controller
    I2cOpenDrain,
}

/// One bus line (SCL or SDA)
pub trait BusPin {
    /// Reconfigure the pin
    fn set_mode(&mut self, mode: PinMode);

    /// Release the line (open-drain high)
    fn set_high(&mut self);

    /// Drive the line low
    fn set_low(&mut self);

    /// Set the output to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Sample the physical line level
    fn is_high(&self) -> bool;

    /// Sample the physical line level
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}
