//! HD44780 character LCD behind a PCF8574 I2C backpack
//!
//! The expander's eight outputs carry the controller's 4-bit data bus plus
//! its control lines:
//!
//! ```text
//!  P7  P6  P5  P4  P3  P2  P1  P0
//!  D7  D6  D5  D4  BL  EN  RW  RS
//! ```
//!
//! Every command or character byte goes out as two nibbles, high first, and
//! every nibble as three expander writes (setup, EN high, EN low) so the
//! enable pulse meets the controller's timing at 100 kHz.

use super::{push_all, TransferBuffer};
use crate::text::{TextBuffer, COLUMNS};

/// Backlight
pub const BL: u8 = 1 << 3;
/// Enable strobe
pub const EN: u8 = 1 << 2;
/// Read/write select (always write)
pub const RW: u8 = 1 << 1;
/// Register select (data when set)
pub const RS: u8 = 1 << 0;

/// HD44780 commands
pub mod cmd {
    pub const ENTRY_MODE: u8 = 0x04;
    pub const DISPLAY_CONTROL: u8 = 0x08;
    pub const FUNCTION_SET: u8 = 0x20;
    pub const SET_DDRAM_ADDR: u8 = 0x80;

    /// FUNCTION_SET: two display lines
    pub const FS_2LINE: u8 = 0x08;
    /// ENTRY_MODE: increment address after each write
    pub const EM_INCREMENT: u8 = 0x02;
    /// DISPLAY_CONTROL: display on
    pub const DC_DISPLAY_ON: u8 = 0x04;
}

/// DDRAM address of the first cell of each row
pub const ROW_ADDRESS: [u8; 2] = [0x00, 0x40];

/// Synchronous 8-bit to 4-bit interface switch: (nibble, delay after in us)
pub const HANDSHAKE: [(u8, u32); 4] = [(0x30, 4100), (0x30, 100), (0x30, 0), (0x20, 0)];

/// Bytes one serialized frame occupies
pub const FRAME_LEN: usize = 2 * (1 + COLUMNS) * 6;

/// The three expander writes that clock one nibble into the controller
pub const fn nibble_writes(value: u8) -> [u8; 3] {
    [value, value | EN, value]
}

/// Queue one nibble (already in D7..D4 position, with control signals)
pub fn emit4(buf: &mut TransferBuffer, value: u8) {
    push_all(buf, &nibble_writes(value));
}

/// Queue a full byte as two nibbles, high first
///
/// `signals` carries RS and BL; the low bits of each nibble are taken from
/// it so the backlight lands on every write.
pub fn emit8(buf: &mut TransferBuffer, value: u8, signals: u8) {
    emit4(buf, (value & 0xf0) | signals);
    emit4(buf, (value << 4) | signals);
}

/// Backlight bit for the current flag
pub const fn backlight_bits(on: bool) -> u8 {
    if on {
        BL
    } else {
        0
    }
}

/// Queue the post-handshake configuration commands
///
/// Two-line mode, display off, increment entry mode, display on.
pub fn init_sequence(buf: &mut TransferBuffer, backlight: bool) {
    let bl = backlight_bits(backlight);
    emit8(buf, cmd::FUNCTION_SET | cmd::FS_2LINE, bl);
    emit8(buf, cmd::DISPLAY_CONTROL, bl);
    emit8(buf, cmd::ENTRY_MODE | cmd::EM_INCREMENT, bl);
    emit8(buf, cmd::DISPLAY_CONTROL | cmd::DC_DISPLAY_ON, bl);
}

/// Serialize the whole grid: address row 0, 16 cells, address row 1, 16 cells
///
/// Returns the number of bytes queued.
pub fn serialize_frame(buf: &mut TransferBuffer, text: &TextBuffer, backlight: bool) -> usize {
    buf.clear();
    let bl = backlight_bits(backlight);
    for (row, cells) in text.rows().enumerate() {
        emit8(buf, cmd::SET_DDRAM_ADDR | ROW_ADDRESS[row], bl);
        for &c in cells {
            emit8(buf, c, RS | bl);
        }
    }
    buf.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    /// Reassemble (byte, signals) pairs from a serialized stream
    fn decode(stream: &[u8]) -> Vec<(u8, u8)> {
        stream
            .chunks(6)
            .map(|w| {
                assert_eq!(w[1], w[0] | EN);
                assert_eq!(w[2], w[0]);
                assert_eq!(w[4], w[3] | EN);
                assert_eq!(w[5], w[3]);
                let byte = (w[0] & 0xf0) | (w[3] >> 4);
                (byte, w[0] & 0x0f)
            })
            .collect()
    }

    #[test]
    fn test_emit8_nibble_order() {
        let mut buf = TransferBuffer::new();
        emit8(&mut buf, 0x48, RS | BL);
        assert_eq!(buf.as_slice(), &[0x49, 0x4d, 0x49, 0x89, 0x8d, 0x89]);
    }

    #[test]
    fn test_hello_frame() {
        let mut text = TextBuffer::new();
        text.write(0, 0, 16, "HELLO");

        let mut buf = TransferBuffer::new();
        let len = serialize_frame(&mut buf, &text, false);
        assert_eq!(len, FRAME_LEN);

        let words = decode(&buf);
        assert_eq!(words[0], (0x80, 0));
        let row0: Vec<u8> = words[1..17].iter().map(|&(b, _)| b).collect();
        assert_eq!(row0.as_slice(), b"HELLO           ");
        assert!(words[1..17].iter().all(|&(_, s)| s == RS));
        assert_eq!(words[17], (0xc0, 0));
    }

    #[test]
    fn test_clear_frame_is_32_blanks() {
        let mut text = TextBuffer::new();
        text.write(0, 0, 0, "JUNK");
        text.clear();

        let mut buf = TransferBuffer::new();
        serialize_frame(&mut buf, &text, false);
        let words = decode(&buf);

        let cells: Vec<&(u8, u8)> = words.iter().filter(|(_, s)| s & RS != 0).collect();
        assert_eq!(cells.len(), 32);
        assert!(cells.iter().all(|&&(b, _)| b == b' '));
        assert_eq!(words[0].0, cmd::SET_DDRAM_ADDR);
        assert_eq!(words[17].0, cmd::SET_DDRAM_ADDR | 0x40);
    }

    #[test]
    fn test_backlight_on_every_write() {
        let text = TextBuffer::new();
        let mut buf = TransferBuffer::new();
        serialize_frame(&mut buf, &text, true);
        assert!(buf.iter().all(|&b| b & BL != 0));

        serialize_frame(&mut buf, &text, false);
        assert!(buf.iter().all(|&b| b & BL == 0));
    }

    #[test]
    fn test_init_sequence_opcodes() {
        let mut buf = TransferBuffer::new();
        init_sequence(&mut buf, false);
        let ops: Vec<u8> = decode(&buf).iter().map(|&(b, _)| b).collect();
        assert_eq!(ops.as_slice(), &[0x28, 0x08, 0x06, 0x0c]);
    }

    #[test]
    fn test_frame_fits_transfer_buffer() {
        assert!(FRAME_LEN <= crate::frame::TRANSFER_CAPACITY);
    }
}
