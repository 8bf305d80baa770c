//! SSD1306 OLED controller
//!
//! The panel is addressed horizontally across a 128-column window. Each text
//! row becomes 256 bytes of glyph columns: 128 for the upper page followed
//! by 128 for the lower page. With the default 128x32 settings the two text
//! rows land in pages 0-3 as a double-height viewport.
//!
//! A frame is split over three DMA transfers (row 0, row 1, re-address)
//! because the glyph data for both rows exceeds the transfer buffer.

use super::{push_all, TransferBuffer};
use crate::config::OledPanel;
use crate::font::GlyphTable;
use crate::text::COLUMNS;

/// Control byte: single command follows (Co=1, D/C#=0)
pub const CONTROL_COMMAND: u8 = 0x80;

/// Control byte: everything that follows is display data (Co=0, D/C#=1)
pub const CONTROL_DATA: u8 = 0x40;

/// Panel width in pixels
pub const WIDTH: usize = 128;

/// Bytes one text row occupies on the wire
pub const ROW_LEN: usize = 2 * WIDTH;

/// SSD1306 commands
pub mod cmd {
    pub const MEMORY_MODE: u8 = 0x20;
    pub const COLUMN_ADDR: u8 = 0x21;
    pub const PAGE_ADDR: u8 = 0x22;
    pub const DEACTIVATE_SCROLL: u8 = 0x2e;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_CHARGE_PUMP: u8 = 0x8d;
    pub const SET_SEG_REMAP: u8 = 0xa1;
    pub const DISPLAY_RAM: u8 = 0xa4;
    pub const SET_NORMAL: u8 = 0xa6;
    pub const SET_MUX_RATIO: u8 = 0xa8;
    pub const DISPLAY_OFF: u8 = 0xae;
    pub const DISPLAY_ON: u8 = 0xaf;
    pub const SET_COM_SCAN_DEC: u8 = 0xc8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xd3;
    pub const SET_CLOCK_DIV: u8 = 0xd5;
    pub const SET_PRECHARGE: u8 = 0xd9;
    pub const SET_COM_PINS: u8 = 0xda;
    pub const SET_VCOM_DETECT: u8 = 0xdb;
}

/// Addressing window sent at the start of every transaction
pub const ADDRESS_WINDOW: [u8; 8] = [
    cmd::MEMORY_MODE,
    0, // horizontal addressing
    cmd::COLUMN_ADDR,
    0,
    127,
    cmd::PAGE_ADDR,
    0,
    3,
];

/// Bytes [`open_transaction`] queues
pub const OPEN_LEN: usize = 2 * (ADDRESS_WINDOW.len() + 1) + 1;

/// Power-on command list for a panel
pub fn init_commands(panel: OledPanel) -> [u8; 22] {
    let (mux, com_pins, contrast) = match panel {
        OledPanel::Rows32 => (31, 0x02, 0x8f),
        OledPanel::Rows64 => (63, 0x12, 0xcf),
    };
    [
        cmd::SET_CLOCK_DIV,
        0x80, // default clock
        cmd::SET_MUX_RATIO,
        mux,
        cmd::SET_DISPLAY_OFFSET,
        0x00,
        cmd::SET_START_LINE,
        cmd::SET_CHARGE_PUMP,
        0x14, // enable
        cmd::SET_SEG_REMAP,
        cmd::SET_COM_SCAN_DEC,
        cmd::SET_COM_PINS,
        com_pins,
        cmd::SET_CONTRAST,
        contrast,
        cmd::SET_PRECHARGE,
        0xf1,
        cmd::SET_VCOM_DETECT,
        0x20,
        cmd::DISPLAY_RAM,
        cmd::SET_NORMAL,
        cmd::DEACTIVATE_SCROLL,
    ]
}

/// Queue commands, each behind its own command control byte
pub fn emit_commands(buf: &mut TransferBuffer, commands: &[u8]) {
    for &c in commands {
        push_all(buf, &[CONTROL_COMMAND, c]);
    }
}

/// Queue the start of a transaction
///
/// Addressing window, display on/off according to the backlight flag, then
/// the data marker so everything after it is pixel data.
pub fn open_transaction(buf: &mut TransferBuffer, backlight: bool) {
    emit_commands(buf, &ADDRESS_WINDOW);
    let power = if backlight {
        cmd::DISPLAY_ON
    } else {
        cmd::DISPLAY_OFF
    };
    emit_commands(buf, &[power]);
    push_all(buf, &[CONTROL_DATA]);
}

/// Render one text row into the buffer as two pages of glyph columns
///
/// Narrow glyphs leave the right-hand columns of each page blank so every
/// row is exactly [`ROW_LEN`] bytes.
pub fn render_row(buf: &mut TransferBuffer, cells: &[u8; COLUMNS], glyphs: &GlyphTable) -> usize {
    buf.clear();
    for half in 0..2 {
        for &c in cells {
            let glyph = glyphs.glyph(c);
            push_all(buf, if half == 0 { glyph.top } else { glyph.bottom });
        }
        let pad = WIDTH * (half + 1) - buf.len();
        for _ in 0..pad {
            push_all(buf, &[0]);
        }
    }
    buf.len()
}

/// Which part of the frame the next transfer carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RowCursor(u8);

impl RowCursor {
    /// Cursor value once both rows have been queued
    pub const READDRESS: u8 = 2;

    /// Start of a frame
    pub const fn new() -> Self {
        Self(0)
    }

    /// Text row queued next, or `None` if the transaction must be restarted
    pub fn row(&self) -> Option<usize> {
        (self.0 < Self::READDRESS).then_some(self.0 as usize)
    }

    /// Raw cursor value (0, 1 or 2)
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Move past the row just queued
    pub fn advance(&mut self) {
        if self.0 < Self::READDRESS {
            self.0 += 1;
        }
    }

    /// Back to row 0 after a new transaction has been opened
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
