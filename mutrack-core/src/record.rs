//! Raw detector records and plane identifiers.

use crate::{Error, Result};
use std::fmt;

/// Number of comma-separated fields per readout line.
pub const RECORD_FIELDS: usize = 6;

/// Identifier for one of the three detector planes, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneId {
    /// Bottom plane (readout suffix `m101`).
    P1,
    /// Middle plane (readout suffix `m102`).
    P2,
    /// Top plane (readout suffix `m103`).
    P3,
}

impl PlaneId {
    /// All planes in bottom-to-top order.
    pub const ALL: [PlaneId; 3] = [PlaneId::P1, PlaneId::P2, PlaneId::P3];

    /// Zero-based plane index.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            PlaneId::P1 => 0,
            PlaneId::P2 => 1,
            PlaneId::P3 => 2,
        }
    }

    /// Readout file suffix for this plane.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            PlaneId::P1 => "m101",
            PlaneId::P2 => "m102",
            PlaneId::P3 => "m103",
        }
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One parsed readout line: `tp1, hex0, hex1, hex2, tp2, evn`.
///
/// Timing fields and the event number are validated as integers at parse
/// time; the three packed hex bytes stay raw until strip decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// First trigger timestamp.
    pub tp1: i64,
    /// Packed strip bytes as hex text, in wire order.
    pub hex: [String; 3],
    /// Second trigger timestamp.
    pub tp2: i64,
    /// Event number assigned by this plane's readout.
    pub evn: i64,
}

impl RawRecord {
    /// Parses one comma-separated readout line.
    ///
    /// # Errors
    /// Returns an error if the field count is not exactly six or if a
    /// timing/event field is not an integer. Such lines are skipped by the
    /// caller; a parse failure is never fatal to the batch.
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != RECORD_FIELDS {
            return Err(Error::MalformedRecord {
                expected: RECORD_FIELDS,
                found: fields.len(),
            });
        }

        let int_field = |field: &'static str, value: &str| -> Result<i64> {
            value.parse().map_err(|_| Error::InvalidField {
                field,
                value: value.to_owned(),
            })
        };

        Ok(Self {
            tp1: int_field("tp1", fields[0])?,
            hex: [
                fields[1].to_owned(),
                fields[2].to_owned(),
                fields[3].to_owned(),
            ],
            tp2: int_field("tp2", fields[4])?,
            evn: int_field("evn", fields[5])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let record = RawRecord::parse("123,08,00,20,456,42").unwrap();
        assert_eq!(record.tp1, 123);
        assert_eq!(record.tp2, 456);
        assert_eq!(record.evn, 42);
        assert_eq!(record.hex, ["08", "00", "20"]);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let record = RawRecord::parse(" 1 , 08 , 00 , 20 , 2 , 3 ").unwrap();
        assert_eq!(record.evn, 3);
        assert_eq!(record.hex[0], "08");
    }

    #[test]
    fn test_parse_wrong_arity() {
        let err = RawRecord::parse("1,2,3,4,5").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRecord {
                expected: 6,
                found: 5
            }
        ));
    }

    #[test]
    fn test_parse_non_numeric_evn() {
        let err = RawRecord::parse("1,08,00,20,2,abc").unwrap_err();
        assert!(matches!(err, Error::InvalidField { field: "evn", .. }));
    }

    #[test]
    fn test_plane_suffixes() {
        assert_eq!(PlaneId::P1.suffix(), "m101");
        assert_eq!(PlaneId::P3.index(), 2);
        assert_eq!(PlaneId::P2.to_string(), "m102");
    }
}
