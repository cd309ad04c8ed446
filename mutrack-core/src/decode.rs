//! Packed strip-word decoding.
//!
//! Each readout line carries three hex bytes that concatenate into a 24-bit
//! word. Counting bit positions from the most significant bit, positions
//! 0-11 are the B axis and positions 12-23 the A axis; the strip index equals
//! the position within its half. A half is only meaningful when exactly one
//! of its bits is set; zero or several set bits yield the [`INVALID_STRIP`]
//! sentinel for that axis. The two halves are validated independently.

use crate::record::RawRecord;
use crate::{Error, Result};

/// Strips per axis on each plane.
pub const STRIPS_PER_AXIS: u32 = 12;

/// Sentinel for an ambiguous or absent strip hit. Not an error.
pub const INVALID_STRIP: i32 = -1;

const HALF_MASK: u32 = (1 << STRIPS_PER_AXIS) - 1;
const WORD_MASK: u32 = (1 << (2 * STRIPS_PER_AXIS)) - 1;

/// One decoded hit with timing and event identity copied through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedHit {
    /// Event number.
    pub evn: i64,
    /// First trigger timestamp.
    pub tp1: i64,
    /// Second trigger timestamp.
    pub tp2: i64,
    /// B-axis strip index, or [`INVALID_STRIP`].
    pub b: i32,
    /// A-axis strip index, or [`INVALID_STRIP`].
    pub a: i32,
}

/// Extracts the strip index from one 12-bit half, MSB-first numbering.
#[inline]
fn half_index(half: u32) -> i32 {
    if half.count_ones() == 1 {
        (STRIPS_PER_AXIS - 1 - half.trailing_zeros()) as i32
    } else {
        INVALID_STRIP
    }
}

/// Decodes a 24-bit strip word into `(b, a)` indices.
#[inline]
#[must_use]
pub fn decode_word(word: u32) -> (i32, i32) {
    let b_half = (word >> STRIPS_PER_AXIS) & HALF_MASK;
    let a_half = word & HALF_MASK;
    (half_index(b_half), half_index(a_half))
}

/// Builds the 24-bit word with exactly one bit set per half. Test helper and
/// inverse of [`decode_word`] for valid indices.
///
/// # Errors
/// Returns an error if either index is outside `[0, 11]`.
pub fn encode_strips(b: u32, a: u32) -> Result<u32> {
    if b >= STRIPS_PER_AXIS {
        return Err(Error::StripIndexOutOfRange(i64::from(b), STRIPS_PER_AXIS - 1));
    }
    if a >= STRIPS_PER_AXIS {
        return Err(Error::StripIndexOutOfRange(i64::from(a), STRIPS_PER_AXIS - 1));
    }
    let b_bit = 1 << (2 * STRIPS_PER_AXIS - 1 - b);
    let a_bit = 1 << (STRIPS_PER_AXIS - 1 - a);
    Ok(b_bit | a_bit)
}

/// Decodes one raw record into a [`DecodedHit`].
///
/// # Errors
/// Returns an error when the concatenated hex fields do not form a valid
/// 24-bit word. The caller skips the record entirely and reports it; no
/// [`DecodedHit`] is produced. Ambiguous bit patterns are not errors.
pub fn decode_record(record: &RawRecord) -> Result<DecodedHit> {
    let text = record.hex.concat();
    let word = u32::from_str_radix(&text, 16)
        .ok()
        .filter(|&w| w <= WORD_MASK)
        .ok_or_else(|| Error::InvalidHitWord(text))?;

    let (b, a) = decode_word(word);
    Ok(DecodedHit {
        evn: record.evn,
        tp1: record.tp1,
        tp2: record.tp2,
        b,
        a,
    })
}
