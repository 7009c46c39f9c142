#![allow(unused_unsafe)]

pub use avr_device::atmega328p::{self as mcu, Peripherals};
pub use avr_device::interrupt;

use crate::{
    mutex::{AnyCtx, IrqSource, LazyMainInit, MainCtx},
    tacho::F_CPU,
};

#[allow(non_snake_case)]
pub struct Dp {
    pub TC0: mcu::TC0,
    pub TC1: mcu::TC1,
    pub TC2: mcu::TC2,
    pub EXINT: mcu::EXINT,
    pub PORTB: mcu::PORTB,
    pub PORTC: mcu::PORTC,
    pub PORTD: mcu::PORTD,
    pub TWI: mcu::TWI,
    pub USART0: mcu::USART0,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

#[inline(always)]
pub fn dp(a: &AnyCtx) -> &'static Dp {
    DP.deref(a)
}

const TIMSK1_OCIE1A: u8 = 1 << 1;
const PCICR_PCIE1: u8 = 1 << 1;
const TIMSK2_OCIE2A: u8 = 1 << 1;

/// Timer1 compare A: the control sample period.
pub struct SampleIrq;

impl IrqSource for SampleIrq {
    #[inline(always)]
    fn disable(m: &MainCtx<'_>) {
        let timsk1 = dp(&m.to_any()).TC1.timsk1();
        // SAFETY: Only OCIE1A changes. The ISR does not touch TIMSK1.
        timsk1.modify(|r, w| unsafe { w.bits(r.bits() & !TIMSK1_OCIE1A) });
    }

    #[inline(always)]
    fn enable(m: &MainCtx<'_>) {
        let timsk1 = dp(&m.to_any()).TC1.timsk1();
        // SAFETY: Only OCIE1A changes. The ISR does not touch TIMSK1.
        timsk1.modify(|r, w| unsafe { w.bits(r.bits() | TIMSK1_OCIE1A) });
    }
}

/// Pin change interrupt 1: tachometer and encoder.
pub struct PinChangeIrq;

impl IrqSource for PinChangeIrq {
    #[inline(always)]
    fn disable(m: &MainCtx<'_>) {
        let pcicr = dp(&m.to_any()).EXINT.pcicr();
        // SAFETY: Only PCIE1 changes. The ISR does not touch PCICR.
        pcicr.modify(|r, w| unsafe { w.bits(r.bits() & !PCICR_PCIE1) });
    }

    #[inline(always)]
    fn enable(m: &MainCtx<'_>) {
        let pcicr = dp(&m.to_any()).EXINT.pcicr();
        // SAFETY: Only PCIE1 changes. The ISR does not touch PCICR.
        pcicr.modify(|r, w| unsafe { w.bits(r.bits() | PCICR_PCIE1) });
    }
}

/// Timer2 compare A: the system tick.
pub struct TickIrq;

impl IrqSource for TickIrq {
    #[inline(always)]
    fn disable(m: &MainCtx<'_>) {
        let timsk2 = dp(&m.to_any()).TC2.timsk2();
        // SAFETY: Only OCIE2A changes. The ISR does not touch TIMSK2.
        timsk2.modify(|r, w| unsafe { w.bits(r.bits() & !TIMSK2_OCIE2A) });
    }

    #[inline(always)]
    fn enable(m: &MainCtx<'_>) {
        let timsk2 = dp(&m.to_any()).TC2.timsk2();
        // SAFETY: Only OCIE2A changes. The ISR does not touch TIMSK2.
        timsk2.modify(|r, w| unsafe { w.bits(r.bits() | TIMSK2_OCIE2A) });
    }
}

/// Busy wait for roughly `us` microseconds.
#[inline(never)]
pub fn delay_us(us: u16) {
    // About 16 cycles per iteration.
    const NOPS: u32 = F_CPU / 1_000_000 - 4;
    for _ in 0..us {
        for _ in 0..NOPS / 4 {
            avr_device::asm::nop();
            avr_device::asm::nop();
            avr_device::asm::nop();
            avr_device::asm::nop();
        }
    }
}

/// Busy wait for roughly `ms` milliseconds. Keeps the watchdog happy.
pub fn delay_ms(ms: u16) {
    for _ in 0..ms {
        delay_us(1000);
        avr_device::asm::wdr();
    }
}

// vim: ts=4 sw=4 expandtab
