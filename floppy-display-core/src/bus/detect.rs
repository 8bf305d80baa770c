//! Controller auto-detection
//!
//! Probes the LCD backpack range, then the OLED range, address by address.
//! The first address that acknowledges wins.

use floppy_display_hal::I2cController;

use super::Transport;
use crate::config::{AddressRange, DriverConfig};
use crate::engine::Controller;
use crate::error::{BusError, InitError};

/// Probe `range` in ascending order, stopping early if the bus dies
pub fn probe_range<I: I2cController>(bus: &mut Transport<I>, range: AddressRange) -> Option<u8> {
    for address in range.iter() {
        if !bus.is_alive() {
            break;
        }
        if bus.probe(address) {
            return Some(address);
        }
    }
    None
}

/// Classify an acknowledging address
pub fn classify(address: u8, config: &DriverConfig) -> Controller {
    if address == config.oled_address {
        Controller::Bitmap(address)
    } else {
        Controller::Character(address)
    }
}

/// Find the attached display controller
pub fn detect<I: I2cController>(
    bus: &mut Transport<I>,
    config: &DriverConfig,
) -> Result<Controller, InitError> {
    let found = probe_range(bus, config.lcd_range).or_else(|| probe_range(bus, config.oled_range));

    match found {
        Some(address) => {
            let controller = classify(address, config);
            match controller {
                Controller::Bitmap(_) => info!("I2C: OLED found at {=u8:#x}", address),
                Controller::Character(_) => info!("I2C: LCD found at {=u8:#x}", address),
            }
            Ok(controller)
        }
        None if !bus.is_alive() => {
            warn!("I2C: bus locked up?");
            Err(InitError::Bus(BusError::Timeout))
        }
        None => {
            warn!("I2C: no device found");
            Err(InitError::NoDeviceFound)
        }
    }
}
