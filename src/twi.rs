#![allow(unused_unsafe)]

use crate::{
    hw::dp,
    mutex::MainCtx,
    periph::BusError,
    tacho::F_CPU,
};

const SCL_HZ: u32 = 100_000;
/// Bit rate register for prescaler 1: (16 MHz / 100 kHz - 16) / 2 = 72.
const TWBR: u8 = ((F_CPU / SCL_HZ - 16) / 2) as u8;

/// Poll iterations before a transfer step is given up.
const TIMEOUT: u16 = 2000;

const TWINT: u8 = 1 << 7;
const TWEA: u8 = 1 << 6;
const TWSTA: u8 = 1 << 5;
const TWSTO: u8 = 1 << 4;
const TWEN: u8 = 1 << 2;

const ST_START: u8 = 0x08;
const ST_REP_START: u8 = 0x10;
const ST_MT_SLA_ACK: u8 = 0x18;
const ST_MT_DATA_ACK: u8 = 0x28;
const ST_MR_SLA_ACK: u8 = 0x40;
const ST_MR_DATA_ACK: u8 = 0x50;
const ST_MR_DATA_NACK: u8 = 0x58;

pub fn twi_init(m: &MainCtx<'_>) {
    let twi = &dp(&m.to_any()).TWI;
    // SAFETY: All bit patterns are valid bit rates.
    twi.twbr().write(|w| unsafe { w.bits(TWBR) });
    // SAFETY: Prescaler 1.
    twi.twsr().write(|w| unsafe { w.bits(0) });
    // SAFETY: Enable the TWI module.
    twi.twcr().write(|w| unsafe { w.bits(TWEN) });
}

fn command(m: &MainCtx<'_>, twcr: u8) -> Result<u8, BusError> {
    let twi = &dp(&m.to_any()).TWI;
    // SAFETY: Writing TWINT starts the next bus step.
    twi.twcr().write(|w| unsafe { w.bits(twcr | TWINT | TWEN) });
    for _ in 0..TIMEOUT {
        if twi.twcr().read().bits() & TWINT != 0 {
            return Ok(twi.twsr().read().bits() & 0xF8);
        }
    }
    Err(BusError::Timeout)
}

fn start(m: &MainCtx<'_>, addr: u8) -> Result<(), BusError> {
    let status = command(m, TWSTA)?;
    if status != ST_START && status != ST_REP_START {
        return Err(BusError::Start);
    }
    let twi = &dp(&m.to_any()).TWI;
    // SAFETY: Any address byte is valid.
    twi.twdr().write(|w| unsafe { w.bits(addr) });
    match command(m, 0)? {
        ST_MT_SLA_ACK | ST_MR_SLA_ACK => Ok(()),
        _ => Err(BusError::AddrNack),
    }
}

fn stop(m: &MainCtx<'_>) {
    let twi = &dp(&m.to_any()).TWI;
    // SAFETY: Generate STOP. TWINT is not set afterwards.
    twi.twcr().write(|w| unsafe { w.bits(TWINT | TWEN | TWSTO) });
}

fn write_bytes(m: &MainCtx<'_>, addr: u8, data: &[u8]) -> Result<(), BusError> {
    start(m, addr << 1)?;
    let twi = &dp(&m.to_any()).TWI;
    for &byte in data {
        // SAFETY: Any data byte is valid.
        twi.twdr().write(|w| unsafe { w.bits(byte) });
        if command(m, 0)? != ST_MT_DATA_ACK {
            return Err(BusError::DataNack);
        }
    }
    Ok(())
}

fn read_bytes(m: &MainCtx<'_>, addr: u8, buf: &mut [u8]) -> Result<(), BusError> {
    start(m, (addr << 1) | 1)?;
    let twi = &dp(&m.to_any()).TWI;
    let len = buf.len();
    for (i, byte) in buf.iter_mut().enumerate() {
        let last = i + 1 == len;
        let status = command(m, if last { 0 } else { TWEA })?;
        let expected = if last { ST_MR_DATA_NACK } else { ST_MR_DATA_ACK };
        if status != expected {
            return Err(BusError::DataNack);
        }
        *byte = twi.twdr().read().bits();
    }
    Ok(())
}

/// Write `data` to the 7 bit address `addr`.
pub fn twi_write(m: &MainCtx<'_>, addr: u8, data: &[u8]) -> Result<(), BusError> {
    let res = write_bytes(m, addr, data);
    stop(m);
    res
}

/// Read `buf.len()` bytes from the 7 bit address `addr`.
pub fn twi_read(m: &MainCtx<'_>, addr: u8, buf: &mut [u8]) -> Result<(), BusError> {
    let res = read_bytes(m, addr, buf);
    stop(m);
    res
}

// vim: ts=4 sw=4 expandtab
