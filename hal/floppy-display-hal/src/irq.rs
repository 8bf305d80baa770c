//! Interrupt controller abstraction

/// Interrupt sources used by the display driver
///
/// All three run at one shared priority so they never preempt each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Irq {
    /// I2C event (start sent, address acknowledged)
    BusEvent,
    /// I2C error; also pended by the transfer watchdog
    BusError,
    /// DMA transfer complete
    DmaComplete,
}

/// Per-source interrupt control
pub trait IrqControl {
    /// Set the priority of a source
    fn set_priority(&mut self, irq: Irq, priority: u8);

    /// Unmask a source
    fn enable(&mut self, irq: Irq);

    /// Mask a source
    fn disable(&mut self, irq: Irq);

    /// Clear a pending request
    fn clear_pending(&mut self, irq: Irq);

    /// Pend a request from software
    fn set_pending(&mut self, irq: Irq);
}
