#![allow(unused_unsafe)]

use crate::{debug, hw::dp, mutex::{IrqCtx, MainCtx}, tacho::F_CPU};

const BAUD: u32 = 19_200;
const UBRR: u16 = (F_CPU / (16 * BAUD) - 1) as u16;

const UCSR0B_TXCIE0: u8 = 1 << 6;
const UCSR0B_TXEN0: u8 = 1 << 3;
const UCSR0C_8N1: u8 = 0b0000_0110;

/// Start the debug value stream on USART0.
pub fn usart_init(m: &MainCtx<'_>) {
    let usart = &dp(&m.to_any()).USART0;
    // SAFETY: All bit patterns are valid baud rate settings.
    usart.ubrr0().write(|w| unsafe { w.bits(UBRR) });
    // SAFETY: 8 data bits, no parity, 1 stop bit.
    usart.ucsr0c().write(|w| unsafe { w.bits(UCSR0C_8N1) });
    // SAFETY: Transmitter and TX complete interrupt on.
    usart.ucsr0b().write(|w| unsafe { w.bits(UCSR0B_TXEN0 | UCSR0B_TXCIE0) });
    // The first byte kicks off the TX complete interrupt chain.
    // SAFETY: Any data byte is valid.
    usart.udr0().write(|w| unsafe { w.bits(debug::SYNC) });
}

pub fn irq_handler_tx(c: &IrqCtx<'_>) {
    let data = debug::tx_next(c.cs());
    let usart = &dp(&c.to_any()).USART0;
    // SAFETY: Any data byte is valid.
    usart.udr0().write(|w| unsafe { w.bits(data) });
}

// vim: ts=4 sw=4 expandtab
