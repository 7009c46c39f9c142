use crate::mutex::{IrqCtx, IrqCtxCell};

/// PC1: Encoder phase A.
pub const PIN_ENC_A: u8 = 1 << 1;
/// PC2: Encoder phase B. Sampled, but does not raise the interrupt.
pub const PIN_ENC_B: u8 = 1 << 2;
/// PC3: Tachometer.
pub const PIN_TACHO: u8 = 1 << 3;

/// The pins that raise the shared pin change interrupt.
pub const PCINT_MASK: u8 = PIN_ENC_A | PIN_TACHO;

/// Rising edges found in one pin change interrupt.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Edges(u8);

impl Edges {
    pub const fn tacho(&self) -> bool {
        self.0 & PIN_TACHO != 0
    }

    pub const fn encoder(&self) -> bool {
        self.0 & PIN_ENC_A != 0
    }
}

/// Demultiplexer for the shared pin change interrupt.
pub struct PinChange {
    prev: IrqCtxCell<u8>,
}

impl PinChange {
    pub const fn new() -> Self {
        Self {
            prev: IrqCtxCell::new(0),
        }
    }

    /// Compare the port state against the previous snapshot and
    /// return the low to high transitions.
    pub fn sample(&self, c: &IrqCtx<'_>, pins: u8) -> Edges {
        let now = pins & PCINT_MASK;
        let prev = self.prev.replace(c, now);
        Edges(now & !prev)
    }
}


// vim: ts=4 sw=4 expandtab
