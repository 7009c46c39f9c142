//! Capability interfaces of the attached peripherals.
//!
//! The control logic only talks to hardware through these traits.
//! The ATmega328P implementation lives in `board`; the host tests use fakes.

use crate::mutex::{IrqCtx, IrqSource, MainCtx};

/// Peripheral bus (I2C) failure.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BusError {
    /// START condition was not acknowledged by the bus.
    Start,
    /// No device answered the address.
    AddrNack,
    /// The device did not acknowledge a data byte.
    DataNack,
    /// The bus hardware did not finish in time.
    Timeout,
}

/// Column scanned key matrix.
pub trait KeyMatrix {
    /// Read the matrix port. Row bits are active high, column bits
    /// read back the currently driven columns.
    fn read_matrix(&self, m: &MainCtx<'_>) -> Result<u8, BusError>;

    /// Drive the column lines. A low bit selects a column.
    fn drive_columns(&self, m: &MainCtx<'_>, cols: u8) -> Result<(), BusError>;
}

/// Character display with a cursor.
pub trait TextDisplay {
    fn clear(&self, m: &MainCtx<'_>);
    fn set_cursor(&self, m: &MainCtx<'_>, col: u8, row: u8);
    fn print(&self, m: &MainCtx<'_>, text: &[u8]);
    fn blink(&self, m: &MainCtx<'_>, on: bool);
}

pub trait SegmentOutput {
    /// Write a raw (active low) segment pattern.
    fn write_segments(&self, m: &MainCtx<'_>, pattern: u8);
}

pub trait Led {
    fn set_led(&self, m: &MainCtx<'_>, on: bool);
}

pub trait Actuator {
    /// Set the motor drive duty cycle. Called from the sample interrupt.
    fn write_duty(&self, c: &IrqCtx<'_>, duty: u8);
}

/// Everything the system needs from the board.
pub trait Board: KeyMatrix + TextDisplay + SegmentOutput + Led + Actuator {
    /// The sample timer interrupt.
    type SampleIrq: IrqSource;
    /// The pin change interrupt of the tachometer and encoder lines.
    type PinChangeIrq: IrqSource;
}

// vim: ts=4 sw=4 expandtab
