//! Host side fakes of the peripherals.

use crate::{
    msgbus::{Message, Publish},
    mutex::{IrqCtx, IrqSource, MainCtx},
    periph::{Actuator, Board, BusError, KeyMatrix, Led, SegmentOutput, TextDisplay},
};
use core::cell::{Cell, RefCell};
use std::vec::Vec;

/// Interrupt source without hardware.
pub struct NoIrq;

impl IrqSource for NoIrq {
    fn disable(_m: &MainCtx<'_>) {}
    fn enable(_m: &MainCtx<'_>) {}
}

/// Publisher that records everything.
#[derive(Default)]
pub struct Recorder(RefCell<Vec<Message>>);

impl Recorder {
    pub fn take(&self) -> Vec<Message> {
        self.0.take()
    }
}

impl Publish for Recorder {
    fn publish(&self, _m: &MainCtx<'_>, msg: Message) {
        self.0.borrow_mut().push(msg);
    }
}

/// Key matrix with the row and column bits set by the test.
pub struct FakeMatrix {
    pub rows: Cell<u8>,
    pub cols: Cell<u8>,
    pub fail: Cell<bool>,
}

impl FakeMatrix {
    pub fn new() -> Self {
        Self {
            rows: Cell::new(0),
            cols: Cell::new(0b111),
            fail: Cell::new(false),
        }
    }

    /// Press the key at the given raw matrix pattern.
    pub fn press(&self, pattern: u8) {
        self.rows.set(pattern & 0b0111_1000);
        self.cols.set(pattern & 0b0000_0111);
    }

    pub fn release(&self) {
        self.rows.set(0);
    }
}

impl KeyMatrix for FakeMatrix {
    fn read_matrix(&self, _m: &MainCtx<'_>) -> Result<u8, BusError> {
        if self.fail.get() {
            Err(BusError::AddrNack)
        } else {
            Ok(self.rows.get() | self.cols.get())
        }
    }

    fn drive_columns(&self, _m: &MainCtx<'_>, cols: u8) -> Result<(), BusError> {
        if self.fail.get() {
            Err(BusError::AddrNack)
        } else {
            // The pressed key only shows up on its row while its column is driven.
            self.cols.set(cols);
            Ok(())
        }
    }
}

/// 16x2 character display frame buffer.
pub struct FakeLcd {
    frame: RefCell<[[u8; 16]; 2]>,
    cursor: Cell<(u8, u8)>,
    pub blinking: Cell<bool>,
}

impl FakeLcd {
    pub fn new() -> Self {
        Self {
            frame: RefCell::new([[b' '; 16]; 2]),
            cursor: Cell::new((0, 0)),
            blinking: Cell::new(false),
        }
    }

    pub fn line(&self, row: usize) -> [u8; 16] {
        self.frame.borrow()[row]
    }

    pub fn text(&self, col: usize, row: usize, len: usize) -> Vec<u8> {
        self.frame.borrow()[row][col..col + len].to_vec()
    }

    pub fn cursor(&self) -> (u8, u8) {
        self.cursor.get()
    }
}

impl TextDisplay for FakeLcd {
    fn clear(&self, _m: &MainCtx<'_>) {
        *self.frame.borrow_mut() = [[b' '; 16]; 2];
        self.cursor.set((0, 0));
    }

    fn set_cursor(&self, _m: &MainCtx<'_>, col: u8, row: u8) {
        self.cursor.set((col, row));
    }

    fn print(&self, _m: &MainCtx<'_>, text: &[u8]) {
        let (mut col, row) = self.cursor.get();
        let mut frame = self.frame.borrow_mut();
        for &ch in text {
            if (col as usize) < 16 && (row as usize) < 2 {
                frame[row as usize][col as usize] = ch;
            }
            col += 1;
        }
        self.cursor.set((col, row));
    }

    fn blink(&self, _m: &MainCtx<'_>, on: bool) {
        self.blinking.set(on);
    }
}

/// All peripherals of the board.
pub struct FakeBoard {
    pub matrix: FakeMatrix,
    pub lcd: FakeLcd,
    pub segments: Cell<u8>,
    pub led: Cell<bool>,
    pub duty: Cell<u8>,
}

impl FakeBoard {
    pub fn new() -> Self {
        Self {
            matrix: FakeMatrix::new(),
            lcd: FakeLcd::new(),
            segments: Cell::new(0xFF),
            led: Cell::new(false),
            duty: Cell::new(0),
        }
    }
}

impl KeyMatrix for FakeBoard {
    fn read_matrix(&self, m: &MainCtx<'_>) -> Result<u8, BusError> {
        self.matrix.read_matrix(m)
    }

    fn drive_columns(&self, m: &MainCtx<'_>, cols: u8) -> Result<(), BusError> {
        self.matrix.drive_columns(m, cols)
    }
}

impl TextDisplay for FakeBoard {
    fn clear(&self, m: &MainCtx<'_>) {
        self.lcd.clear(m);
    }

    fn set_cursor(&self, m: &MainCtx<'_>, col: u8, row: u8) {
        self.lcd.set_cursor(m, col, row);
    }

    fn print(&self, m: &MainCtx<'_>, text: &[u8]) {
        self.lcd.print(m, text);
    }

    fn blink(&self, m: &MainCtx<'_>, on: bool) {
        self.lcd.blink(m, on);
    }
}

impl SegmentOutput for FakeBoard {
    fn write_segments(&self, _m: &MainCtx<'_>, pattern: u8) {
        self.segments.set(pattern);
    }
}

impl Led for FakeBoard {
    fn set_led(&self, _m: &MainCtx<'_>, on: bool) {
        self.led.set(on);
    }
}

impl Actuator for FakeBoard {
    fn write_duty(&self, _c: &IrqCtx<'_>, duty: u8) {
        self.duty.set(duty);
    }
}

impl Board for FakeBoard {
    type SampleIrq = NoIrq;
    type PinChangeIrq = NoIrq;
}

// vim: ts=4 sw=4 expandtab
