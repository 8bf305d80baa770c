//! Transfer watchdog
//!
//! Occasionally the I2C/DMA pair wedges without raising an error. Every
//! transfer re-arms a single-shot alarm; if it ever expires, the board pends
//! the bus error interrupt and the engine recovers exactly as it would from
//! a controller-reported fault.

use embassy_time::Duration;
use floppy_display_hal::AlarmTimer;

/// Rearmable transfer timeout
pub struct Watchdog<A> {
    alarm: A,
    timeout: Duration,
    armed: bool,
}

impl<A: AlarmTimer> Watchdog<A> {
    /// Wrap an alarm; nothing is armed yet
    pub fn new(alarm: A, timeout: Duration) -> Self {
        Self {
            alarm,
            timeout,
            armed: false,
        }
    }

    /// Restart the countdown for a newly started transfer
    pub fn rearm(&mut self) {
        self.alarm.arm(self.timeout);
        self.armed = true;
    }

    /// Stop the countdown
    pub fn cancel(&mut self) {
        self.alarm.cancel();
        self.armed = false;
    }

    /// True between `rearm` and `cancel`
    ///
    /// The driver does not observe expiry directly; after it fires this stays
    /// true until recovery cancels it.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Sim;

    #[test]
    fn test_rearm_and_cancel() {
        let sim = Sim::with_devices(&[]);
        let mut watchdog = Watchdog::new(sim.alarm(), Duration::from_millis(200));
        assert!(!watchdog.is_armed());

        watchdog.rearm();
        watchdog.rearm();
        assert!(watchdog.is_armed());
        assert_eq!(sim.state().alarm, Some(Duration::from_millis(200)));
        assert_eq!(sim.state().alarm_arms, 2);

        watchdog.cancel();
        assert!(!watchdog.is_armed());
        assert_eq!(sim.state().alarm, None);
    }
}
