//! Electrical bus recovery
//!
//! A peer reset mid-transfer can be left in an acknowledge cycle, holding
//! SDA low until it sees another clock. Before the controller takes the
//! lines, drive them by hand: finish the peer's cycle with one low pulse on
//! SCL, then synthesise a stop condition.

use floppy_display_hal::{BusPin, DelayNs, PinMode};

/// Settle time between line changes
pub const SETTLE_US: u32 = 10;

/// Result of the stuck-line check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recovery {
    /// Both lines were already released
    Idle,
    /// SDA was held low and is now free
    Released,
    /// SDA (or SCL) is still held low after the stop sequence
    StillHeld,
}

/// Release a peer stuck mid-acknowledge
pub fn release_stuck_bus<SCL, SDA, D>(scl: &mut SCL, sda: &mut SDA, delay: &mut D) -> Recovery
where
    SCL: BusPin,
    SDA: BusPin,
    D: DelayNs,
{
    scl.set_mode(PinMode::OpenDrainOutput);
    sda.set_mode(PinMode::OpenDrainOutput);
    scl.set_high();
    sda.set_high();
    delay.delay_us(SETTLE_US);

    if !(scl.is_high() && sda.is_low()) {
        return Recovery::Idle;
    }

    warn!("I2C: SDA held by peer, releasing");
    // Hold SDA low alongside the peer and pull SCL low to end its ACK cycle
    sda.set_low();
    scl.set_low();
    delay.delay_us(SETTLE_US);
    // Peer has let go of SDA; raise SCL ready for the stop condition
    scl.set_high();
    delay.delay_us(SETTLE_US);
    // SDA rising while SCL is high is the stop condition
    sda.set_high();
    delay.delay_us(SETTLE_US);

    if scl.is_low() || sda.is_low() {
        warn!("I2C: bus still held");
        Recovery::StillHeld
    } else {
        info!("I2C: bus released");
        Recovery::Released
    }
}

/// Check that both lines are pulled up externally
///
/// The internal pull-downs are too weak to beat a real bus pull-up, so a
/// line that reads low here is floating or driven.
pub fn bus_is_pulled_up<SCL, SDA, D>(scl: &mut SCL, sda: &mut SDA, delay: &mut D) -> bool
where
    SCL: BusPin,
    SDA: BusPin,
    D: DelayNs,
{
    scl.set_mode(PinMode::PullDownInput);
    sda.set_mode(PinMode::PullDownInput);
    delay.delay_us(SETTLE_US);
    scl.is_high() && sda.is_high()
}

/// Hand both lines to the I2C controller
pub fn attach<SCL: BusPin, SDA: BusPin>(scl: &mut SCL, sda: &mut SDA) {
    scl.set_mode(PinMode::I2cOpenDrain);
    sda.set_mode(PinMode::I2cOpenDrain);
}

/// Leave both lines as pulled-up inputs (safe idle)
pub fn park<SCL: BusPin, SDA: BusPin>(scl: &mut SCL, sda: &mut SDA) {
    scl.set_mode(PinMode::PullUpInput);
    sda.set_mode(PinMode::PullUpInput);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Line, PinEvent, Sim};

    #[test]
    fn test_idle_bus_untouched() {
        let sim = Sim::with_devices(&[]);
        let (mut scl, mut sda, mut delay) = (sim.scl(), sim.sda(), sim.delay());
        assert_eq!(release_stuck_bus(&mut scl, &mut sda, &mut delay), Recovery::Idle);
        assert!(!sim
            .state()
            .pin_log
            .contains(&(Line::Scl, PinEvent::Low)));
    }

    #[test]
    fn test_stuck_sda_released_with_stop() {
        let sim = Sim::with_devices(&[]);
        sim.state().sda_held_by_peer = true;
        let (mut scl, mut sda, mut delay) = (sim.scl(), sim.sda(), sim.delay());

        assert_eq!(
            release_stuck_bus(&mut scl, &mut sda, &mut delay),
            Recovery::Released
        );

        let state = sim.state();
        let drives: std::vec::Vec<_> = state
            .pin_log
            .iter()
            .filter(|(_, e)| matches!(e, PinEvent::Low | PinEvent::High))
            .copied()
            .collect();
        assert_eq!(
            &drives[2..],
            &[
                (Line::Sda, PinEvent::Low),
                (Line::Scl, PinEvent::Low),
                (Line::Scl, PinEvent::High),
                (Line::Sda, PinEvent::High),
            ]
        );
        assert!(!state.sda_held_by_peer);
    }

    #[test]
    fn test_sda_shorted_low_reports_still_held() {
        let sim = Sim::with_devices(&[]);
        sim.state().sda_shorted = true;
        let (mut scl, mut sda, mut delay) = (sim.scl(), sim.sda(), sim.delay());
        assert_eq!(
            release_stuck_bus(&mut scl, &mut sda, &mut delay),
            Recovery::StillHeld
        );
    }

    #[test]
    fn test_pull_up_check() {
        let sim = Sim::with_devices(&[]);
        let (mut scl, mut sda, mut delay) = (sim.scl(), sim.sda(), sim.delay());
        assert!(bus_is_pulled_up(&mut scl, &mut sda, &mut delay));

        sim.state().floating = true;
        assert!(!bus_is_pulled_up(&mut scl, &mut sda, &mut delay));
    }

    #[test]
    fn test_attach_and_park_modes() {
        let sim = Sim::with_devices(&[]);
        let (mut scl, mut sda) = (sim.scl(), sim.sda());
        attach(&mut scl, &mut sda);
        assert_eq!(sim.state().modes, [PinMode::I2cOpenDrain; 2]);
        park(&mut scl, &mut sda);
        assert_eq!(sim.state().modes, [PinMode::PullUpInput; 2]);
    }
}
