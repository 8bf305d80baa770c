//! DMA channel abstraction
//!
//! The channel is preconfigured by the board to target the I2C data
//! register; the driver only supplies the source buffer.

/// Memory-to-peripheral DMA channel
pub trait DmaChannel {
    /// Start a byte-wide transfer of `data` to the I2C data register
    ///
    /// The implementation latches the buffer address. The caller must not
    /// rewrite `data` until the completion interrupt fires or
    /// [`stop`](DmaChannel::stop) is called. Completion raises
    /// [`Irq::DmaComplete`](crate::Irq::DmaComplete).
    fn start(&mut self, data: &[u8]);

    /// Disable the channel and clear its interrupt flags
    ///
    /// Used both to acknowledge a completion and to abort a transfer.
    fn stop(&mut self);
}
