use crate::{
    debug::Debug,
    fixpt::Fixpt,
    mutex::{IrqCtx, IrqCtxCell, IrqGuardedCell, IrqSource, MainCtx},
};

pub const F_CPU: u32 = 16_000_000;

/// Sample timer (Timer1) prescaler.
pub const SAMPLE_PRESCALE: u32 = 64;

/// Sample timer (Timer1) compare value.
pub const SAMPLE_TOP: u16 = 0xFFFF;

/// Sample period: 65536 * 64 / 16 MHz = 262144 us.
pub const SAMPLE_PERIOD_US: u32 = (SAMPLE_TOP as u32 + 1) * SAMPLE_PRESCALE / (F_CPU / 1_000_000);

/// Samples per second.
pub const SAMPLE_HZ: Fixpt = Fixpt::from_fraction(1_000_000, SAMPLE_PERIOD_US as i32);

/// Revolutions per second from the pulses counted in one sample period.
pub fn rate_from_count(count: u16) -> Fixpt {
    Fixpt::from(count) * SAMPLE_HZ
}

/// Tachometer pulse counter.
///
/// `S` is the sample timer interrupt that snapshots the counter.
pub struct Tacho<S> {
    pulses: IrqCtxCell<u16>,
    sample: IrqGuardedCell<u16, S>,
}

impl<S: IrqSource> Tacho<S> {
    pub const fn new() -> Self {
        Self {
            pulses: IrqCtxCell::new(0),
            sample: IrqGuardedCell::new(0),
        }
    }

    /// Tachometer edge. Pin change interrupt.
    pub fn pulse(&self, c: &IrqCtx<'_>) {
        let count = self.pulses.get(c).saturating_add(1);
        self.pulses.set(c, count);
    }

    /// Sample period boundary. Sample timer interrupt.
    ///
    /// Snapshots and resets the pulse counter and returns the rate.
    pub fn sample(&self, c: &IrqCtx<'_>) -> Fixpt {
        let count = self.pulses.replace(c, 0);
        self.sample.set_irq(c, count);
        rate_from_count(count)
    }

    /// Integer rate of the last sample period.
    ///
    /// For display only. Not suitable for control.
    pub fn display_rps(&self, m: &MainCtx<'_>) -> u16 {
        let count = self.pulse_count(m);
        Debug::PulseCount.log_u16(count);
        rate_from_count(count).to_int().max(0) as u16
    }

    /// Pulses counted in the last sample period.
    pub fn pulse_count(&self, m: &MainCtx<'_>) -> u16 {
        self.sample.read(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{fixpt::fixpt, testutil::NoIrq};

    #[test]
    fn test_sample_period() {
        assert_eq!(SAMPLE_PERIOD_US, 262_144);
        // 1e6 / 262144 = 3.8147 -> Q16 truncated
        assert_eq!(SAMPLE_HZ.to_q(), 250_000);
    }

    #[test]
    fn test_count_and_sample() {
        let m = unsafe { MainCtx::new() };
        let c = unsafe { IrqCtx::new() };
        let tacho: Tacho<NoIrq> = Tacho::new();

        for _ in 0..262 {
            tacho.pulse(&c);
        }
        // Nothing reaches the task side before the boundary.
        assert_eq!(tacho.pulse_count(&m), 0);
        let rate = tacho.sample(&c);
        assert_eq!(rate.to_int(), 999);
        assert_eq!(tacho.pulse_count(&m), 262);
        assert_eq!(tacho.display_rps(&m), 999);

        // Counter was reset at the boundary.
        let rate = tacho.sample(&c);
        assert_eq!(rate, fixpt!(0));
        assert_eq!(tacho.display_rps(&m), 0);
    }

    #[test]
    fn test_rate_resolution() {
        // One pulse per period is the rate resolution.
        assert_eq!(rate_from_count(1), SAMPLE_HZ);
        assert_eq!(rate_from_count(26).to_int(), 99);
        assert_eq!(rate_from_count(27).to_int(), 102);
        assert_eq!(rate_from_count(u16::MAX).to_int(), i16::MAX);
    }
}

// vim: ts=4 sw=4 expandtab
