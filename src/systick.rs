#![allow(unused_unsafe)]

use crate::{
    hw::{TickIrq, dp},
    mutex::{IrqCtx, IrqGuardedCell, MainCtx},
    timer::{RelTimestamp, TIMER_TICK_MS, Timestamp},
};

static TICKS: IrqGuardedCell<Timestamp, TickIrq> = IrqGuardedCell::new(Timestamp::new());

#[rustfmt::skip]
pub fn systick_init(m: &MainCtx<'_>) {
    let tc2 = &dp(&m.to_any()).TC2;

    // Timer 2 configuration:
    // CTC mode, prescaler 64, OCR2A 249 -> 16 MHz / 64 / 250 = 1 kHz.
    const _: () = assert!(TIMER_TICK_MS == 1);
    // SAFETY: All bit patterns are valid timer configurations.
    tc2.tccr2a().write(|w| unsafe { w.bits(0b0000_0010) }); // WGM21
    // SAFETY: See above.
    tc2.tccr2b().write(|w| unsafe { w.bits(0b0000_0100) }); // CS22
    // SAFETY: See above.
    tc2.tcnt2().write(|w| unsafe { w.bits(0) });
    // SAFETY: See above.
    tc2.ocr2a().write(|w| unsafe { w.bits(249) });
    // SAFETY: See above.
    tc2.tifr2().write(|w| unsafe { w.bits(0b0000_0010) }); // clear OCF2A
    // SAFETY: See above.
    tc2.timsk2().write(|w| unsafe { w.bits(0b0000_0010) }); // OCIE2A
}

/// Current system time.
pub fn timer_get(m: &MainCtx<'_>) -> Timestamp {
    TICKS.read(m)
}

pub fn irq_handler_tick(c: &IrqCtx<'_>) {
    let now = TICKS.get_irq(c) + RelTimestamp::from_ticks(1);
    TICKS.set_irq(c, now);
}

// vim: ts=4 sw=4 expandtab
