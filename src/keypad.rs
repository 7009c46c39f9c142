use crate::{
    debug::Debug,
    msgbus::{Message, Publish},
    mutex::{MainCtx, MainCtxCell},
    periph::KeyMatrix,
    sseg::VALUE_BLANK_DP,
    timer::{RelTimestamp, SwTimer, Timestamp},
};

const DEBOUNCE: RelTimestamp = RelTimestamp::from_millis(10);

/// Row inputs of the matrix port. High means closed.
pub const ROW_MASK: u8 = 0b0111_1000;
/// Column outputs of the matrix port. Low selects the column.
pub const COL_MASK: u8 = 0b0000_0111;
/// The first column of the scan.
pub const COL_FIRST: u8 = 0b0000_0110;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Key {
    Digit(u8),
    Backspace,
    Enter,
}

impl Key {
    pub const fn value(&self) -> u8 {
        match *self {
            Self::Digit(d) => d,
            Self::Backspace => 0x0a,
            Self::Enter => 0x0b,
        }
    }

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0..=9 => Some(Self::Digit(value)),
            0x0a => Some(Self::Backspace),
            0x0b => Some(Self::Enter),
            _ => None,
        }
    }
}

/// Raw matrix pattern (rows | driven columns) to key.
#[rustfmt::skip]
const SCANCODES: [(u8, Key); 12] = [
    (0b0100_0011, Key::Digit(1)),
    (0b0100_0101, Key::Digit(2)),
    (0b0100_0110, Key::Digit(3)),
    (0b0010_0011, Key::Digit(4)),
    (0b0010_0101, Key::Digit(5)),
    (0b0010_0110, Key::Digit(6)),
    (0b0001_0011, Key::Digit(7)),
    (0b0001_0101, Key::Digit(8)),
    (0b0001_0110, Key::Digit(9)),
    (0b0000_1011, Key::Backspace),
    (0b0000_1101, Key::Digit(0)),
    (0b0000_1110, Key::Enter),
];

pub fn decode(pattern: u8) -> Option<Key> {
    SCANCODES
        .iter()
        .find(|(code, _)| *code == pattern)
        .map(|(_, key)| *key)
}

/// The column to drive after `cols`.
pub const fn next_column(cols: u8) -> u8 {
    match cols & COL_MASK {
        0b110 => 0b101,
        0b101 => 0b011,
        _ => COL_FIRST,
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum KeyState {
    Idle,
    PressDetected,
    Pressed,
}

/// Key matrix scanner and debouncer.
pub struct Keypad {
    state: MainCtxCell<KeyState>,
    captured: MainCtxCell<u8>,
    cols: MainCtxCell<u8>,
    key: MainCtxCell<Option<Key>>,
    timer: SwTimer,
    bus_errors: MainCtxCell<u16>,
}

impl Keypad {
    pub const fn new() -> Self {
        Self {
            state: MainCtxCell::new(KeyState::Idle),
            captured: MainCtxCell::new(0),
            cols: MainCtxCell::new(COL_FIRST),
            key: MainCtxCell::new(None),
            timer: SwTimer::new(DEBOUNCE),
            bus_errors: MainCtxCell::new(0),
        }
    }

    pub fn state(&self, m: &MainCtx<'_>) -> KeyState {
        self.state.get(m)
    }

    fn read(&self, m: &MainCtx<'_>, matrix: &impl KeyMatrix) -> u8 {
        match matrix.read_matrix(m) {
            Ok(pattern) => pattern,
            Err(_) => {
                let errors = self.bus_errors.get(m).saturating_add(1);
                self.bus_errors.set(m, errors);
                Debug::KeypadBusErrors.log_u16(errors);
                0
            }
        }
    }

    /// Keypad task.
    pub fn run(
        &self,
        m: &MainCtx<'_>,
        out: &impl Publish,
        matrix: &impl KeyMatrix,
        now: Timestamp,
    ) {
        let pattern = self.read(m, matrix);

        match self.state.get(m) {
            KeyState::Idle => {
                if pattern & ROW_MASK != 0 {
                    self.captured.set(m, pattern);
                    self.timer.set(m, now);
                    self.state.set(m, KeyState::PressDetected);
                } else {
                    let cols = next_column(self.cols.get(m));
                    self.cols.set(m, cols);
                    // A failed write is repeated by the next scan step.
                    let _ = matrix.drive_columns(m, cols);
                }
            }
            KeyState::PressDetected => {
                if pattern != self.captured.get(m) {
                    // Bounce.
                    self.state.set(m, KeyState::Idle);
                } else if self.timer.is_expired(m, now) {
                    let key = decode(pattern);
                    self.key.set(m, key);
                    if let Some(key) = key {
                        out.publish(m, Message::Change7Seg(key.value()));
                        out.publish(m, Message::KeyPressed(key.value()));
                    }
                    self.state.set(m, KeyState::Pressed);
                }
            }
            KeyState::Pressed => {
                if pattern != self.captured.get(m) {
                    if let Some(key) = self.key.replace(m, None) {
                        out.publish(m, Message::KeyReleased(key.value()));
                        out.publish(m, Message::Change7Seg(VALUE_BLANK_DP));
                    }
                    self.state.set(m, KeyState::Idle);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::{FakeMatrix, Recorder};

    const KEY_5: u8 = 0b0010_0101;
    const KEY_9: u8 = 0b0001_0110;

    #[test]
    fn test_decode_table() {
        for d in 0..=9 {
            let code = SCANCODES
                .iter()
                .find(|(_, key)| *key == Key::Digit(d))
                .map(|(code, _)| *code);
            assert!(code.is_some());
        }
        assert_eq!(decode(0b0100_0110), Some(Key::Digit(3)));
        assert_eq!(decode(0b0000_1101), Some(Key::Digit(0)));
        assert_eq!(decode(0b0000_1011), Some(Key::Backspace));
        assert_eq!(decode(0b0000_1110), Some(Key::Enter));
        assert_eq!(decode(0b0110_0110), None);
        assert_eq!(decode(0), None);

        // Every pattern maps to a distinct key.
        for (i, (_, a)) in SCANCODES.iter().enumerate() {
            for (_, b) in &SCANCODES[i + 1..] {
                assert_ne!(a, b);
            }
        }
        for value in 0..=0x0b {
            assert_eq!(Key::from_value(value).map(|k| k.value()), Some(value));
        }
        assert_eq!(Key::from_value(0x0c), None);
    }

    #[test]
    fn test_column_rotation() {
        assert_eq!(next_column(0b110), 0b101);
        assert_eq!(next_column(0b101), 0b011);
        assert_eq!(next_column(0b011), 0b110);
        assert_eq!(next_column(0b111), 0b110);
        assert_eq!(next_column(0b000), 0b110);

        let m = unsafe { MainCtx::new() };
        let out = Recorder::default();
        let matrix = FakeMatrix::new();
        let kp = Keypad::new();
        kp.run(&m, &out, &matrix, Timestamp(0));
        assert_eq!(matrix.cols.get(), 0b101);
        kp.run(&m, &out, &matrix, Timestamp(1));
        assert_eq!(matrix.cols.get(), 0b011);
        kp.run(&m, &out, &matrix, Timestamp(2));
        assert_eq!(matrix.cols.get(), 0b110);
    }

    #[test]
    fn test_debounced_press_and_release() {
        let m = unsafe { MainCtx::new() };
        let out = Recorder::default();
        let matrix = FakeMatrix::new();
        let kp = Keypad::new();

        matrix.press(KEY_5);
        kp.run(&m, &out, &matrix, Timestamp(0));
        assert_eq!(kp.state(&m), KeyState::PressDetected);
        kp.run(&m, &out, &matrix, Timestamp(5));
        assert_eq!(kp.state(&m), KeyState::PressDetected);
        assert!(out.take().is_empty());

        kp.run(&m, &out, &matrix, Timestamp(10));
        assert_eq!(kp.state(&m), KeyState::Pressed);
        assert_eq!(
            out.take(),
            [Message::Change7Seg(5), Message::KeyPressed(5)]
        );

        // Held.
        kp.run(&m, &out, &matrix, Timestamp(500));
        assert!(out.take().is_empty());

        matrix.release();
        kp.run(&m, &out, &matrix, Timestamp(600));
        assert_eq!(kp.state(&m), KeyState::Idle);
        assert_eq!(
            out.take(),
            [Message::KeyReleased(5), Message::Change7Seg(VALUE_BLANK_DP)]
        );
    }

    #[test]
    fn test_bounce_rejected() {
        let m = unsafe { MainCtx::new() };
        let out = Recorder::default();
        let matrix = FakeMatrix::new();
        let kp = Keypad::new();

        matrix.press(KEY_5);
        kp.run(&m, &out, &matrix, Timestamp(0));
        matrix.press(KEY_9);
        kp.run(&m, &out, &matrix, Timestamp(4));
        assert_eq!(kp.state(&m), KeyState::Idle);
        assert!(out.take().is_empty());

        // The new pattern has to be stable for its own debounce time.
        kp.run(&m, &out, &matrix, Timestamp(12));
        assert_eq!(kp.state(&m), KeyState::PressDetected);
        kp.run(&m, &out, &matrix, Timestamp(21));
        assert!(out.take().is_empty());
        kp.run(&m, &out, &matrix, Timestamp(22));
        assert_eq!(
            out.take(),
            [Message::Change7Seg(9), Message::KeyPressed(9)]
        );
    }

    #[test]
    fn test_release_before_expiry() {
        let m = unsafe { MainCtx::new() };
        let out = Recorder::default();
        let matrix = FakeMatrix::new();
        let kp = Keypad::new();

        matrix.press(KEY_5);
        kp.run(&m, &out, &matrix, Timestamp(0));
        matrix.release();
        kp.run(&m, &out, &matrix, Timestamp(10));
        assert_eq!(kp.state(&m), KeyState::Idle);
        assert!(out.take().is_empty());
    }

    #[test]
    fn test_unmapped_pattern() {
        let m = unsafe { MainCtx::new() };
        let out = Recorder::default();
        let matrix = FakeMatrix::new();
        let kp = Keypad::new();

        // Two rows closed in the same column.
        matrix.press(0b0110_0110);
        kp.run(&m, &out, &matrix, Timestamp(0));
        kp.run(&m, &out, &matrix, Timestamp(10));
        assert_eq!(kp.state(&m), KeyState::Pressed);
        matrix.release();
        kp.run(&m, &out, &matrix, Timestamp(20));
        assert_eq!(kp.state(&m), KeyState::Idle);
        assert!(out.take().is_empty());
    }

    #[test]
    fn test_bus_failure_reads_as_released() {
        let m = unsafe { MainCtx::new() };
        let out = Recorder::default();
        let matrix = FakeMatrix::new();
        let kp = Keypad::new();

        matrix.press(KEY_5);
        kp.run(&m, &out, &matrix, Timestamp(0));
        kp.run(&m, &out, &matrix, Timestamp(10));
        out.take();

        matrix.fail.set(true);
        kp.run(&m, &out, &matrix, Timestamp(11));
        assert_eq!(kp.state(&m), KeyState::Idle);
        assert_eq!(
            out.take(),
            [Message::KeyReleased(5), Message::Change7Seg(VALUE_BLANK_DP)]
        );
        assert_eq!(kp.bus_errors.get(&m), 1);

        // Scanning goes on with failed column writes.
        kp.run(&m, &out, &matrix, Timestamp(12));
        assert_eq!(kp.state(&m), KeyState::Idle);
        assert_eq!(kp.bus_errors.get(&m), 2);
    }
}

// vim: ts=4 sw=4 expandtab
