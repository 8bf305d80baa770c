//! Frame serializers
//!
//! Turn the text grid into the byte stream each controller expects. Both
//! serializers fill the same fixed-capacity transfer buffer, which is what
//! the DMA channel streams to the I2C data register.

pub mod hd44780;
pub mod ssd1306;

/// Largest single DMA transfer
pub const TRANSFER_CAPACITY: usize = 256;

/// Wire payload for one DMA transfer
pub type TransferBuffer = heapless::Vec<u8, TRANSFER_CAPACITY>;

/// Append bytes that are known to fit
///
/// Every serializer is sized against [`TRANSFER_CAPACITY`]; overflowing it
/// is a logic error in the serializer, not a runtime condition.
pub(crate) fn push_all(buf: &mut TransferBuffer, bytes: &[u8]) {
    let pushed = buf.extend_from_slice(bytes);
    debug_assert!(pushed.is_ok(), "transfer buffer overflow");
}
