//! Software timer abstraction

use embassy_time::Duration;

/// Rearmable single-shot timer
///
/// On expiry the implementation pends [`Irq::BusError`](crate::Irq::BusError)
/// so that a stalled transfer is handled by the same code path as a
/// controller-reported bus fault.
pub trait AlarmTimer {
    /// Arm (or re-arm) the timer to expire `after` from now
    fn arm(&mut self, after: Duration);

    /// Cancel a pending expiry
    fn cancel(&mut self);
}
