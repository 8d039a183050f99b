//! Integer to ASCII conversion
//!
//! Digits are produced most significant first and written straight to the
//! output context; nothing is staged. Loops are bounded by the digit count
//! of the widest value (10 decimal, 16 hex).

use super::format::Padding;
use super::out::CharOut;

/// Most decimal digits in a 32-bit value
pub const DEC_DIGITS: u32 = 10;
/// Most hex digits in a 64-bit value
pub const HEX_DIGITS: u32 = 16;

/// Emit the overflow marker
pub fn err<O: CharOut + ?Sized>(out: &mut O) {
    out.out_all(b"ERR");
}

/// Print `num` in decimal
///
/// An unset or zero width behaves as 1, so zero always prints a digit.
pub fn dec<O: CharOut + ?Sized>(out: &mut O, num: u32, padding: Padding, width: Option<u32>) {
    let width = width.unwrap_or(0).max(1);
    let mut pos: u32 = 999_999_999;
    let mut remainder = num;
    let mut found_largest_digit = false;
    let mut remaining = DEC_DIGITS;
    let mut digits: u32 = 1;

    while pos >= 9 {
        if found_largest_digit || remainder > pos {
            found_largest_digit = true;
            out.out(b'0' + (remainder / (pos + 1)) as u8);
            digits += 1;
        } else if remaining <= width && padding != Padding::SpaceAfter && padding != Padding::None {
            out.out(if padding == Padding::ZeroBefore { b'0' } else { b' ' });
            digits += 1;
        }
        remaining -= 1;
        remainder %= pos + 1;
        pos /= 10;
    }
    out.out(b'0' + remainder as u8);

    if padding == Padding::SpaceAfter {
        pad_spaces(out, width.saturating_sub(digits));
    }
}

/// Print `num` in lowercase hex
pub fn hex<O: CharOut + ?Sized>(out: &mut O, num: u64, padding: Padding, width: Option<u32>) {
    let width = width.unwrap_or(0);
    let mut found_largest_digit = false;
    let mut remaining = HEX_DIGITS;
    let mut digits: u32 = 0;

    for size in (1..=HEX_DIGITS).rev() {
        let nibble = ((num >> ((size - 1) * 4)) & 0xf) as u8;

        if nibble != 0 || found_largest_digit || size == 1 {
            found_largest_digit = true;
            out.out(hex_digit(nibble));
            digits += 1;
            continue;
        }

        if remaining <= width {
            match padding {
                Padding::ZeroBefore => out.out(b'0'),
                Padding::SpaceBefore => out.out(b' '),
                Padding::None | Padding::SpaceAfter => {}
            }
        }
        remaining -= 1;
    }

    if padding == Padding::SpaceAfter {
        pad_spaces(out, width.saturating_sub(digits));
    }
}

#[inline]
fn hex_digit(nibble: u8) -> u8 {
    if nibble > 9 {
        b'a' + (nibble - 10)
    } else {
        b'0' + nibble
    }
}

fn pad_spaces<O: CharOut + ?Sized>(out: &mut O, n: u32) {
    for _ in 0..n {
        out.out(b' ');
    }
}
