// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::mutex::{CriticalSection, Mutex};
use core::cell::Cell;

/// Debug value channels.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Debug {
    ActualRps,
    DemandRps,
    PiOutput,
    PulseCount,
    BusDrops,
    KeypadBusErrors,
}
const NRVALUES: usize = 6;

const INDEXSHIFT: usize = 2;
const INDEXMASK: u8 = (1 << INDEXSHIFT) - 1;

/// Frame id that marks the end of one pass over all channels.
pub const SYNC: u8 = 0xFF;

/// Latest value of each channel plus the transmit position.
pub struct DebugTable {
    values: Mutex<[Cell<u16>; NRVALUES]>,
    index: Mutex<Cell<u8>>,
}

impl DebugTable {
    pub const fn new() -> Self {
        Self {
            values: Mutex::new([const { Cell::new(0) }; NRVALUES]),
            index: Mutex::new(Cell::new(0)),
        }
    }

    pub fn set(&self, cs: CriticalSection<'_>, id: Debug, value: u16) {
        self.values.borrow(cs)[id as usize].set(value);
    }

    /// Next byte of the transmit stream.
    ///
    /// Each channel goes out as `[id, lo, hi]`.
    /// After the last channel a `[0xFF, 0xFF, 0xFF]` sync frame follows.
    pub fn tx_next(&self, cs: CriticalSection<'_>) -> u8 {
        let index = self.index.borrow(cs);
        let cur = index.get();
        let id = cur >> INDEXSHIFT;
        let part = cur & INDEXMASK;

        let value = if id < NRVALUES as u8 {
            self.values.borrow(cs)[id as usize].get()
        } else {
            0xFFFF
        };

        match part {
            0 => {
                index.set(cur + 1);
                if id < NRVALUES as u8 { id } else { SYNC }
            }
            1 => {
                index.set(cur + 1);
                value as u8
            }
            _ => {
                if id >= NRVALUES as u8 {
                    index.set(0);
                } else {
                    index.set((id + 1) << INDEXSHIFT);
                }
                (value >> 8) as u8
            }
        }
    }
}

static TABLE: DebugTable = DebugTable::new();

impl Debug {
    /// Store the latest value of the channel. Main context only.
    ///
    /// The short critical section keeps the table consistent for the UART interrupt.
    pub fn log_u16(&self, value: u16) {
        critical_section::with(|cs| TABLE.set(cs, *self, value));
    }

    pub fn log_u8(&self, value: u8) {
        self.log_u16(value.into())
    }
}

/// Next byte for the debug UART. Called from the TX complete interrupt.
pub fn tx_next(cs: CriticalSection<'_>) -> u8 {
    TABLE.tx_next(cs)
}


// vim: ts=4 sw=4 expandtab
