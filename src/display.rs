use crate::{
    control::{RPS_MAX, RPS_MIN},
    keypad::Key,
    msgbus::{Message, Publish},
    mutex::{MainCtx, MainCtxCell},
    periph::TextDisplay,
    timer::{RelTimestamp, SwTimer, Timestamp},
};

const ERROR_DUR: RelTimestamp = RelTimestamp::from_millis(2000);

/// Column of the speed values on the status screen.
const VALUE_COL: u8 = 12;
/// Column of the first digit on the entry screen.
const ENTRY_COL: u8 = 9;
/// Digits of an entry.
const MAX_DIGITS: usize = 3;

const ROW_ACTUAL: u8 = 0;
const ROW_DEMAND: u8 = 1;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DispState {
    Refresh,
    Idle,
    Updating,
    Validate,
    Error,
}

/// Three digit decimal with leading zeros. Saturates at 999.
pub fn fmt3(value: u16) -> [u8; 3] {
    let value = value.min(999);
    [
        b'0' + (value / 100) as u8,
        b'0' + (value / 10 % 10) as u8,
        b'0' + (value % 10) as u8,
    ]
}

/// Keypad entry check. Zero passes and is raised to the minimum later.
pub fn is_valid_entry(rps: u16) -> bool {
    !(rps > RPS_MAX || (rps < RPS_MIN && rps != 0))
}

fn parse(digits: &[u8]) -> u16 {
    digits.iter().fold(0, |acc, &d| acc * 10 + u16::from(d))
}

/// LCD screens and the keypad speed entry.
pub struct Display {
    state: MainCtxCell<DispState>,
    actual: MainCtxCell<u16>,
    demand: MainCtxCell<u16>,
    entered: MainCtxCell<u16>,
    digits: MainCtxCell<[u8; MAX_DIGITS]>,
    /// Digits in the buffer. Always what the entry field shows.
    len: MainCtxCell<u8>,
    cursor: MainCtxCell<u8>,
    err_timer: SwTimer,
}

impl Display {
    pub const fn new() -> Self {
        Self {
            state: MainCtxCell::new(DispState::Refresh),
            actual: MainCtxCell::new(0),
            demand: MainCtxCell::new(0),
            entered: MainCtxCell::new(0),
            digits: MainCtxCell::new([0; MAX_DIGITS]),
            len: MainCtxCell::new(0),
            cursor: MainCtxCell::new(0),
            err_timer: SwTimer::new(ERROR_DUR),
        }
    }

    pub fn state(&self, m: &MainCtx<'_>) -> DispState {
        self.state.get(m)
    }

    pub fn init(&self, m: &MainCtx<'_>, lcd: &impl TextDisplay) {
        lcd.clear(m);
        lcd.set_cursor(m, 0, 0);
        lcd.print(m, b"Starting..");
        self.state.set(m, DispState::Refresh);
    }

    fn draw_value(&self, m: &MainCtx<'_>, lcd: &impl TextDisplay, row: u8, value: u16) {
        lcd.set_cursor(m, VALUE_COL, row);
        lcd.print(m, &fmt3(value));
    }

    fn draw_status(&self, m: &MainCtx<'_>, lcd: &impl TextDisplay) {
        lcd.set_cursor(m, 0, ROW_ACTUAL);
        lcd.print(m, b"Actual RPS:");
        self.draw_value(m, lcd, ROW_ACTUAL, self.actual.get(m));
        lcd.set_cursor(m, 0, ROW_DEMAND);
        lcd.print(m, b"Demand RPS:");
        self.draw_value(m, lcd, ROW_DEMAND, self.demand.get(m));
    }

    /// Display task.
    pub fn run(
        &self,
        m: &MainCtx<'_>,
        out: &impl Publish,
        lcd: &impl TextDisplay,
        now: Timestamp,
    ) {
        match self.state.get(m) {
            DispState::Refresh => {
                self.draw_status(m, lcd);
                self.state.set(m, DispState::Idle);
            }
            DispState::Idle | DispState::Updating => (),
            DispState::Validate => {
                let rps = self.entered.get(m);
                if is_valid_entry(rps) {
                    lcd.clear(m);
                    self.state.set(m, DispState::Refresh);
                    out.publish(m, Message::NewRpsKeypad(rps));
                } else {
                    lcd.set_cursor(m, 2, 1);
                    lcd.print(m, b"INVALID RPS");
                    self.err_timer.set(m, now);
                    self.state.set(m, DispState::Error);
                }
            }
            DispState::Error => {
                if self.err_timer.is_expired(m, now) {
                    lcd.clear(m);
                    lcd.set_cursor(m, 0, 0);
                    lcd.print(m, b"RE-SET:");
                    let text = fmt3(self.entered.get(m));
                    lcd.set_cursor(m, ENTRY_COL, 0);
                    lcd.print(m, &text);
                    lcd.set_cursor(m, ENTRY_COL, 0);
                    lcd.blink(m, true);
                    // Enter alone commits the shown value again.
                    self.digits.set(m, text.map(|ch| ch - b'0'));
                    self.len.set(m, MAX_DIGITS as u8);
                    self.cursor.set(m, 0);
                    self.state.set(m, DispState::Updating);
                }
            }
        }
    }

    fn update_value(
        &self,
        m: &MainCtx<'_>,
        lcd: &impl TextDisplay,
        cell: &MainCtxCell<u16>,
        row: u8,
        value: u16,
    ) {
        if cell.replace(m, value) != value
            && matches!(self.state.get(m), DispState::Idle | DispState::Refresh)
        {
            self.draw_value(m, lcd, row, value);
        }
    }

    /// New actual speed message.
    pub fn on_actual_rps(&self, m: &MainCtx<'_>, lcd: &impl TextDisplay, rps: u16) {
        self.update_value(m, lcd, &self.actual, ROW_ACTUAL, rps);
    }

    /// New demand speed message.
    pub fn on_demand_rps(&self, m: &MainCtx<'_>, lcd: &impl TextDisplay, rps: u16) {
        self.update_value(m, lcd, &self.demand, ROW_DEMAND, rps);
    }

    /// Put a digit at the cursor and blank the rest of the entry field.
    fn type_digit(&self, m: &MainCtx<'_>, lcd: &impl TextDisplay, digit: u8) {
        let pos = self.cursor.get(m);
        if pos as usize >= MAX_DIGITS {
            return;
        }
        let mut digits = self.digits.get(m);
        digits[pos as usize] = digit;
        self.digits.set(m, digits);

        let mut field = [b' '; MAX_DIGITS];
        field[0] = b'0' + digit;
        lcd.set_cursor(m, ENTRY_COL + pos, 0);
        lcd.print(m, &field[..MAX_DIGITS - pos as usize]);

        let pos = pos + 1;
        self.len.set(m, pos);
        self.cursor.set(m, pos);
        lcd.set_cursor(m, ENTRY_COL + pos, 0);
    }

    /// Key pressed message.
    pub fn on_key_pressed(&self, m: &MainCtx<'_>, lcd: &impl TextDisplay, value: u8) {
        let Some(key) = Key::from_value(value) else {
            return;
        };

        match (self.state.get(m), key) {
            (DispState::Idle | DispState::Refresh, Key::Digit(d)) => {
                self.len.set(m, 0);
                self.cursor.set(m, 0);
                lcd.clear(m);
                lcd.set_cursor(m, 0, 0);
                lcd.print(m, b"New RPS:");
                self.type_digit(m, lcd, d);
                lcd.blink(m, true);
                self.state.set(m, DispState::Updating);
            }
            (DispState::Updating, Key::Digit(d)) => {
                self.type_digit(m, lcd, d);
            }
            (DispState::Updating, Key::Backspace) => {
                let pos = self.cursor.get(m);
                if pos > 0 {
                    let pos = pos - 1;
                    self.len.set(m, pos);
                    self.cursor.set(m, pos);
                    lcd.set_cursor(m, ENTRY_COL + pos, 0);
                    lcd.print(m, b" ");
                    lcd.set_cursor(m, ENTRY_COL + pos, 0);
                }
            }
            (DispState::Updating, Key::Enter) => {
                let count = self.len.get(m) as usize;
                if count == 0 {
                    return;
                }
                let digits = self.digits.get(m);
                self.cursor.set(m, 0);
                self.entered.set(m, parse(&digits[..count]));
                lcd.blink(m, false);
                self.state.set(m, DispState::Validate);
            }
            _ => (),
        }
    }
}


// vim: ts=4 sw=4 expandtab
