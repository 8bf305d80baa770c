//! Driver configuration
//!
//! Defaults match the usual hardware: PCF8574 backpacks strap to
//! 0x20-0x27, PCF8574A and SSD1306 parts to 0x38-0x3f, with the OLED at 0x3c.

use embassy_time::Duration;

use crate::font::GlyphFont;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default address range probed for a character LCD backpack
pub const LCD_RANGE: AddressRange = AddressRange::new(0x20, 0x27);

/// Default address range probed second
pub const OLED_RANGE: AddressRange = AddressRange::new(0x38, 0x3f);

/// Default SSD1306 address
pub const OLED_ADDRESS: u8 = 0x3c;

/// Bound on every synchronous bus wait
pub const BUS_TIMEOUT_MS: u32 = 10;

/// Bound on a single DMA transfer
pub const WATCHDOG_TIMEOUT_MS: u32 = 200;

/// Shared priority for the bus event, bus error and DMA interrupts
pub const IRQ_PRIORITY: u8 = 4;

/// Inclusive range of 7-bit I2C addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AddressRange {
    /// First address probed
    pub first: u8,
    /// Last address probed
    pub last: u8,
}

impl AddressRange {
    /// Create a range
    pub const fn new(first: u8, last: u8) -> Self {
        Self { first, last }
    }

    /// Check whether `address` lies in the range
    pub const fn contains(&self, address: u8) -> bool {
        address >= self.first && address <= self.last
    }

    /// Addresses in probe order (ascending)
    pub fn iter(&self) -> core::ops::RangeInclusive<u8> {
        self.first..=self.last
    }
}

/// SSD1306 panel geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OledPanel {
    /// 128x32 panel
    #[default]
    Rows32,
    /// 128x64 panel; the 128x32 settings would give a double-height
    /// viewport on alternate lines, which is a usable fallback
    Rows64,
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A probe range is empty or outside the 7-bit address space
    InvalidRange,
    /// The OLED address is not covered by either probe range
    OledAddressNotProbed,
    /// A timeout is zero
    ZeroTimeout,
}

/// Display driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// Probed first
    pub lcd_range: AddressRange,
    /// Probed second
    pub oled_range: AddressRange,
    /// An acknowledge at this address selects the bitmap controller
    pub oled_address: u8,
    /// Bound on synchronous bus waits (ms)
    pub bus_timeout_ms: u32,
    /// Bound on a DMA transfer before recovery is forced (ms)
    pub watchdog_timeout_ms: u32,
    /// Priority shared by the three interrupt sources
    pub irq_priority: u8,
    /// Glyph table for the bitmap controller
    pub font: GlyphFont,
    /// Bitmap controller panel geometry
    pub panel: OledPanel,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            lcd_range: LCD_RANGE,
            oled_range: OLED_RANGE,
            oled_address: OLED_ADDRESS,
            bus_timeout_ms: BUS_TIMEOUT_MS,
            watchdog_timeout_ms: WATCHDOG_TIMEOUT_MS,
            irq_priority: IRQ_PRIORITY,
            font: GlyphFont::default(),
            panel: OledPanel::default(),
        }
    }
}

impl DriverConfig {
    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        for range in [self.lcd_range, self.oled_range] {
            if range.first > range.last || range.last > 0x7f {
                return Err(ConfigError::InvalidRange);
            }
        }
        if !self.lcd_range.contains(self.oled_address)
            && !self.oled_range.contains(self.oled_address)
        {
            return Err(ConfigError::OledAddressNotProbed);
        }
        if self.bus_timeout_ms == 0 || self.watchdog_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Synchronous wait bound
    pub fn bus_timeout(&self) -> Duration {
        Duration::from_millis(self.bus_timeout_ms as u64)
    }

    /// Watchdog period
    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog_timeout_ms as u64)
    }
}
