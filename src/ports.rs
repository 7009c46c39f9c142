#![allow(unused_unsafe)]

use crate::{
    hw::dp,
    mutex::{AnyCtx, MainCtx},
};

fn pin_input(_bit: u8) -> u8 {
    0
}
fn pin_output(bit: u8) -> u8 {
    1 << bit
}
fn pin_low(_bit: u8) -> u8 {
    0
}
fn pin_high(bit: u8) -> u8 {
    1 << bit
}
fn pin_floating(_bit: u8) -> u8 {
    0
}

/// PB0: Shift register clock.
pub const PB_SSEG_CLK: u8 = 0;
/// PB5: Status LED.
pub const PB_LED: u8 = 5;

/// PD2: ISR timing measurement.
pub const PD_TIMING: u8 = 2;
/// PD4: Shift register data.
pub const PD_SSEG_DATA: u8 = 4;
/// PD6: OC0A motor PWM.
pub const PD_PWM: u8 = 6;
/// PD7: Shift register latch.
pub const PD_SSEG_LATCH: u8 = 7;

#[rustfmt::skip]
pub fn ports_init(m: &MainCtx<'_>) {
    let dp = dp(&m.to_any());

    // SAFETY: All bit patterns are valid port configurations.
    dp.PORTB.portb().write(|w| unsafe { w.bits(
        pin_low(0) |        // PB0: sseg clock
        pin_floating(1) |   // PB1: n/c
        pin_floating(2) |   // PB2: n/c
        pin_floating(3) |   // PB3: n/c
        pin_floating(4) |   // PB4: n/c
        pin_low(5) |        // PB5: LED
        pin_floating(6) |   // PB6: XTAL
        pin_floating(7)     // PB7: XTAL
    ) });
    // SAFETY: All bit patterns are valid port configurations.
    dp.PORTB.ddrb().write(|w| unsafe { w.bits(
        pin_output(0) |
        pin_input(1) |
        pin_input(2) |
        pin_input(3) |
        pin_input(4) |
        pin_output(5) |
        pin_input(6) |
        pin_input(7)
    ) });

    // SAFETY: All bit patterns are valid port configurations.
    dp.PORTC.portc().write(|w| unsafe { w.bits(
        pin_floating(0) |   // PC0: n/c
        pin_floating(1) |   // PC1: encoder A
        pin_floating(2) |   // PC2: encoder B
        pin_floating(3) |   // PC3: tacho
        pin_high(4) |       // PC4: SDA, pull up
        pin_high(5) |       // PC5: SCL, pull up
        pin_floating(6) |   // PC6: reset
        pin_floating(7)
    ) });
    // SAFETY: All bit patterns are valid port configurations.
    dp.PORTC.ddrc().write(|w| unsafe { w.bits(
        pin_input(0) |
        pin_input(1) |
        pin_input(2) |
        pin_input(3) |
        pin_input(4) |
        pin_input(5) |
        pin_input(6) |
        pin_input(7)
    ) });

    // SAFETY: All bit patterns are valid port configurations.
    dp.PORTD.portd().write(|w| unsafe { w.bits(
        pin_floating(0) |   // PD0: RXD
        pin_high(1) |       // PD1: TXD idle
        pin_low(2) |        // PD2: timing
        pin_floating(3) |   // PD3: n/c
        pin_low(4) |        // PD4: sseg data
        pin_floating(5) |   // PD5: n/c
        pin_low(6) |        // PD6: PWM
        pin_high(7)         // PD7: sseg latch
    ) });
    // SAFETY: All bit patterns are valid port configurations.
    dp.PORTD.ddrd().write(|w| unsafe { w.bits(
        pin_input(0) |
        pin_output(1) |
        pin_output(2) |
        pin_input(3) |
        pin_output(4) |
        pin_input(5) |
        pin_output(6) |
        pin_output(7)
    ) });
}

pub fn portb_set(a: &AnyCtx, bit: u8, value: bool) {
    let portb = dp(a).PORTB.portb();
    // SAFETY: All bit patterns are valid port values.
    if value {
        portb.modify(|r, w| unsafe { w.bits(r.bits() | (1 << bit)) });
    } else {
        portb.modify(|r, w| unsafe { w.bits(r.bits() & !(1 << bit)) });
    }
}

/// Set a PORTD output.
///
/// The ISR timing pin shares PORTD with the main context outputs.
/// A timing pulse can be lost if it hits a main context update.
pub fn portd_set(a: &AnyCtx, bit: u8, value: bool) {
    let portd = dp(a).PORTD.portd();
    // SAFETY: All bit patterns are valid port values.
    if value {
        portd.modify(|r, w| unsafe { w.bits(r.bits() | (1 << bit)) });
    } else {
        portd.modify(|r, w| unsafe { w.bits(r.bits() & !(1 << bit)) });
    }
}

/// Read the tachometer and encoder lines.
#[inline(always)]
pub fn pinc_read(a: &AnyCtx) -> u8 {
    dp(a).PORTC.pinc().read().bits()
}

// vim: ts=4 sw=4 expandtab
