use crate::{
    fixpt::{Fixpt, fixpt},
    mutex::{IrqCtx, IrqCtxCell},
};

pub const OUT_MIN: Fixpt = fixpt!(0);
pub const OUT_MAX: Fixpt = fixpt!(255);

#[derive(Clone)]
pub struct PiParams {
    /// Weight of the current deviation.
    pub a1: Fixpt,
    /// Weight of the previous deviation.
    pub a0: Fixpt,
}

/// Discrete PI controller in velocity form.
///
/// `y[k] = clamp(y[k-1] + a1 * e[k] + a0 * e[k-1], 0, 255)`
///
/// The clamped output is fed back, so the controller does not wind up
/// while the actuator is saturated.
pub struct Pi {
    prev_e: IrqCtxCell<Fixpt>,
    prev_y: IrqCtxCell<Fixpt>,
}

impl Pi {
    pub const fn new() -> Self {
        Self {
            prev_e: IrqCtxCell::new(Fixpt::zero()),
            prev_y: IrqCtxCell::new(Fixpt::zero()),
        }
    }

    pub fn run(&self, c: &IrqCtx<'_>, params: &PiParams, sp: Fixpt, r: Fixpt) -> Fixpt {
        // deviation
        let e = sp - r;

        let y = self.prev_y.get(c) + (params.a1 * e) + (params.a0 * self.prev_e.get(c));
        let y = y.clamp(OUT_MIN, OUT_MAX);

        self.prev_e.set(c, e);
        self.prev_y.set(c, y);
        y
    }

    pub fn prev_output(&self, c: &IrqCtx<'_>) -> Fixpt {
        self.prev_y.get(c)
    }

    pub fn prev_error(&self, c: &IrqCtx<'_>) -> Fixpt {
        self.prev_e.get(c)
    }
}

/// Actuator duty cycle from the controller output.
pub fn duty(y: Fixpt) -> u8 {
    y.clamp(OUT_MIN, OUT_MAX).to_int() as u8
}


// vim: ts=4 sw=4 expandtab
