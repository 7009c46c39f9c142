use crate::{
    msgbus::{Message, Publish},
    mutex::{IrqCtx, IrqGuardedCell, IrqSource, MainCtx},
};

/// Rotary encoder.
///
/// The pin change interrupt accumulates the detents. The task side drains
/// them and publishes one message per detent.
pub struct Encoder<S> {
    delta: IrqGuardedCell<i8, S>,
}

impl<S: IrqSource> Encoder<S> {
    pub const fn new() -> Self {
        Self {
            delta: IrqGuardedCell::new(0),
        }
    }

    /// Rising edge of phase A. Pin change interrupt.
    ///
    /// Phase B high means counter clockwise.
    pub fn edge(&self, c: &IrqCtx<'_>, phase_b: bool) {
        let step = if phase_b { -1 } else { 1 };
        let delta = self.delta.get_irq(c).saturating_add(step);
        self.delta.set_irq(c, delta);
    }

    /// Encoder task.
    pub fn run(&self, m: &MainCtx<'_>, out: &impl Publish) {
        let delta = self.delta.take(m);
        let tick = if delta < 0 { -1 } else { 1 };
        for _ in 0..delta.unsigned_abs() {
            out.publish(m, Message::Encoder(tick));
        }
    }
}


// vim: ts=4 sw=4 expandtab
