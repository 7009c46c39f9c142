#![allow(unused_unsafe)]

use crate::{
    hw::{PinChangeIrq, SampleIrq, delay_ms, delay_us, dp},
    keypad::COL_FIRST,
    mutex::{IrqCtx, MainCtx},
    periph::{Actuator, Board, BusError, KeyMatrix, Led, SegmentOutput, TextDisplay},
    pinchange::PCINT_MASK,
    ports::{PB_LED, PB_SSEG_CLK, PD_SSEG_DATA, PD_SSEG_LATCH, portb_set, portd_set},
    tacho::{SAMPLE_PRESCALE, SAMPLE_TOP},
    twi::{twi_read, twi_write},
};

/// MCP23017 port expander of the key matrix.
const KEY_ADDR: u8 = 0x20;
const MCP_IODIRA: u8 = 0x00;
const MCP_IPOLA: u8 = 0x02;
const MCP_GPIOA: u8 = 0x12;

/// PCF8574 backpack of the 16x2 LCD.
const LCD_ADDR: u8 = 0x27;
const LCD_RS: u8 = 1 << 0;
const LCD_EN: u8 = 1 << 2;
const LCD_BACKLIGHT: u8 = 1 << 3;
const LCD_ROW_OFFS: [u8; 2] = [0x00, 0x40];

const LCD_CMD_CLEAR: u8 = 0x01;
const LCD_CMD_ENTRY_INC: u8 = 0x06;
const LCD_CMD_DISPLAY_ON: u8 = 0x0C;
const LCD_CMD_CURSOR_BLINK: u8 = 0x03;
const LCD_CMD_FUNC_4BIT_2LINE: u8 = 0x28;
const LCD_CMD_DDRAM: u8 = 0x80;

/// The peripherals of the ATmega328P board.
pub struct AvrBoard(());

impl AvrBoard {
    pub const fn new() -> Self {
        Self(())
    }

    /// Bring up the hardware. Interrupts must still be disabled.
    pub fn init(&self, m: &MainCtx<'_>) {
        self.pwm_init(m);
        self.sample_timer_init(m);
        self.pinchange_init(m);
        self.keypad_init(m);
        self.lcd_init(m);
    }

    #[rustfmt::skip]
    fn pwm_init(&self, m: &MainCtx<'_>) {
        let tc0 = &dp(&m.to_any()).TC0;

        // Timer 0 configuration:
        // Fast PWM on OC0A, prescaler 64 -> 976 Hz.
        // SAFETY: All bit patterns are valid timer configurations.
        tc0.ocr0a().write(|w| unsafe { w.bits(0) });
        // SAFETY: See above.
        tc0.tccr0a().write(|w| unsafe { w.bits(0b1000_0011) }); // COM0A1, WGM01, WGM00
        // SAFETY: See above.
        tc0.tccr0b().write(|w| unsafe { w.bits(0b0000_0011) }); // CS01, CS00
    }

    #[rustfmt::skip]
    fn sample_timer_init(&self, m: &MainCtx<'_>) {
        let tc1 = &dp(&m.to_any()).TC1;

        // Timer 1 configuration:
        // CTC mode, prescaler 64, OCR1A = SAMPLE_TOP.
        const _: () = assert!(SAMPLE_PRESCALE == 64);
        // SAFETY: All bit patterns are valid timer configurations.
        tc1.tccr1a().write(|w| unsafe { w.bits(0) });
        // SAFETY: See above.
        tc1.tcnt1().write(|w| unsafe { w.bits(0) });
        // SAFETY: See above.
        tc1.ocr1a().write(|w| unsafe { w.bits(SAMPLE_TOP) });
        // SAFETY: See above.
        tc1.tccr1b().write(|w| unsafe { w.bits(0b0000_1011) }); // WGM12, CS11, CS10
        // SAFETY: See above.
        tc1.tifr1().write(|w| unsafe { w.bits(0b0000_0010) }); // clear OCF1A
        // SAFETY: See above.
        tc1.timsk1().write(|w| unsafe { w.bits(0b0000_0010) }); // OCIE1A
    }

    fn pinchange_init(&self, m: &MainCtx<'_>) {
        let exint = &dp(&m.to_any()).EXINT;
        // PCINT9 (PC1) and PCINT11 (PC3).
        // SAFETY: All bit patterns are valid masks.
        exint.pcmsk1().write(|w| unsafe { w.bits(PCINT_MASK) });
        // SAFETY: Clear PCIF1.
        exint.pcifr().write(|w| unsafe { w.bits(0b0000_0010) });
        // SAFETY: Enable PCIE1.
        exint.pcicr().modify(|r, w| unsafe { w.bits(r.bits() | 0b0000_0010) });
    }

    fn keypad_init(&self, m: &MainCtx<'_>) {
        // GPA0-2 column outputs, GPA3-7 row inputs.
        // The rows are pulled up on the board. Inverting them makes a closed key read high.
        let _ = twi_write(m, KEY_ADDR, &[MCP_IODIRA, 0xF8]);
        let _ = twi_write(m, KEY_ADDR, &[MCP_GPIOA, COL_FIRST]);
        let _ = twi_write(m, KEY_ADDR, &[MCP_IPOLA, 0b0111_1000]);
    }

    fn lcd_nibble(&self, m: &MainCtx<'_>, nibble: u8, rs: bool) {
        let bits = (nibble & 0xF0) | LCD_BACKLIGHT | if rs { LCD_RS } else { 0 };
        // Latched on the falling edge of EN.
        let _ = twi_write(m, LCD_ADDR, &[bits | LCD_EN, bits]);
    }

    fn lcd_send(&self, m: &MainCtx<'_>, byte: u8, rs: bool) {
        self.lcd_nibble(m, byte, rs);
        self.lcd_nibble(m, byte << 4, rs);
    }

    fn lcd_command(&self, m: &MainCtx<'_>, cmd: u8) {
        self.lcd_send(m, cmd, false);
    }

    fn lcd_init(&self, m: &MainCtx<'_>) {
        // HD44780 4 bit initialization by instruction.
        delay_ms(50);
        self.lcd_nibble(m, 0x30, false);
        delay_ms(5);
        self.lcd_nibble(m, 0x30, false);
        delay_us(150);
        self.lcd_nibble(m, 0x30, false);
        self.lcd_nibble(m, 0x20, false);

        self.lcd_command(m, LCD_CMD_FUNC_4BIT_2LINE);
        self.lcd_command(m, LCD_CMD_DISPLAY_ON);
        self.clear(m);
        self.lcd_command(m, LCD_CMD_ENTRY_INC);
    }
}

impl KeyMatrix for AvrBoard {
    fn read_matrix(&self, m: &MainCtx<'_>) -> Result<u8, BusError> {
        let mut matrix = [0];
        twi_write(m, KEY_ADDR, &[MCP_GPIOA])?;
        twi_read(m, KEY_ADDR, &mut matrix)?;
        Ok(matrix[0])
    }

    fn drive_columns(&self, m: &MainCtx<'_>, cols: u8) -> Result<(), BusError> {
        twi_write(m, KEY_ADDR, &[MCP_GPIOA, cols])
    }
}

impl TextDisplay for AvrBoard {
    fn clear(&self, m: &MainCtx<'_>) {
        self.lcd_command(m, LCD_CMD_CLEAR);
        delay_ms(2);
    }

    fn set_cursor(&self, m: &MainCtx<'_>, col: u8, row: u8) {
        let offs = LCD_ROW_OFFS[(row as usize).min(LCD_ROW_OFFS.len() - 1)];
        self.lcd_command(m, LCD_CMD_DDRAM | (offs + col));
    }

    fn print(&self, m: &MainCtx<'_>, text: &[u8]) {
        for &ch in text {
            self.lcd_send(m, ch, true);
        }
    }

    fn blink(&self, m: &MainCtx<'_>, on: bool) {
        let cmd = if on {
            LCD_CMD_DISPLAY_ON | LCD_CMD_CURSOR_BLINK
        } else {
            LCD_CMD_DISPLAY_ON
        };
        self.lcd_command(m, cmd);
    }
}

impl SegmentOutput for AvrBoard {
    fn write_segments(&self, m: &MainCtx<'_>, pattern: u8) {
        let a = m.to_any();
        portd_set(&a, PD_SSEG_LATCH, false);
        for bit in (0..8).rev() {
            portd_set(&a, PD_SSEG_DATA, pattern & (1 << bit) != 0);
            portb_set(&a, PB_SSEG_CLK, true);
            portb_set(&a, PB_SSEG_CLK, false);
        }
        portd_set(&a, PD_SSEG_LATCH, true);
    }
}

impl Led for AvrBoard {
    fn set_led(&self, m: &MainCtx<'_>, on: bool) {
        portb_set(&m.to_any(), PB_LED, on);
    }
}

impl Actuator for AvrBoard {
    fn write_duty(&self, c: &IrqCtx<'_>, duty: u8) {
        let tc0 = &dp(&c.to_any()).TC0;
        // SAFETY: All duty cycles are valid compare values.
        tc0.ocr0a().write(|w| unsafe { w.bits(duty) });
    }
}

impl Board for AvrBoard {
    type SampleIrq = SampleIrq;
    type PinChangeIrq = PinChangeIrq;
}

// vim: ts=4 sw=4 expandtab
