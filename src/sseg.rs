use crate::{mutex::MainCtx, periph::SegmentOutput};

/// Decimal point segment. Active low like all segments.
const DP: u8 = 0b1000_0000;

/// Blank digit with the decimal point lit.
pub const BLANK_DP: u8 = 0b0111_1111;

/// Value that displays [BLANK_DP]. Used as "key released" marker.
pub const VALUE_BLANK_DP: u8 = 0x0c;

/// Value flag: light the decimal point together with the digit.
pub const VALUE_DP: u8 = 0x10;

/// Segment patterns, active low, decimal point off.
#[rustfmt::skip]
const SEGMENTS: [u8; 12] = [
    0b1100_0000, // 0
    0b1100_1111, // 1
    0b1010_0100, // 2
    0b1011_0000, // 3
    0b1001_1001, // 4
    0b1001_0010, // 5
    0b1000_0010, // 6
    0b1111_1000, // 7
    0b1000_0000, // 8
    0b1001_1000, // 9
    0b1000_0011, // b
    0b1000_0110, // E
];

/// Segment pattern for a display value.
///
/// 0-9, 0x0a (`b`) and 0x0b (`E`) show the symbol. 0x0c-0x0f show a blank
/// digit with the decimal point. [VALUE_DP] adds the decimal point to a symbol.
pub const fn pattern(value: u8) -> u8 {
    let dp = value & VALUE_DP != 0;
    let index = (value & 0x0F) as usize;
    if index >= SEGMENTS.len() {
        BLANK_DP
    } else if dp {
        SEGMENTS[index] & !DP
    } else {
        SEGMENTS[index] | DP
    }
}

pub fn sseg_show(m: &MainCtx<'_>, out: &impl SegmentOutput, value: u8) {
    out.write_segments(m, pattern(value));
}


// vim: ts=4 sw=4 expandtab
