//! Persistent hit table.
//!
//! Append-only columnar store for assembled rows, one fixed-width binary
//! record per row: the nine i64 fields `tp1, tp2, evn, B1, B2, B3, A1, A2,
//! A3` in little-endian order, preceded by a 24-byte header (magic, format
//! version, row count). Fixed-width rows make ordinal access an offset
//! computation, so reads go through a memory map. There is no update or
//! delete; rows are immutable once appended.

use crate::{Error, Result};
use memmap2::Mmap;
use mutrack_core::AssembledRow;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"MUTRKTBL";
const FORMAT_VERSION: u64 = 1;
const HEADER_LEN: usize = 24;
const FIELDS_PER_ROW: usize = 9;
const ROW_LEN: usize = FIELDS_PER_ROW * 8;

/// Column names in storage order.
pub const COLUMNS: [&str; FIELDS_PER_ROW] =
    ["tp1", "tp2", "evn", "B1", "B2", "B3", "A1", "A2", "A3"];

/// Append-only writer for the hit table.
///
/// The row count in the header is written by [`HitTableWriter::finish`];
/// dropping the writer without finishing leaves the file unreadable, which
/// is deliberate for aborted runs.
pub struct HitTableWriter {
    writer: BufWriter<File>,
    rows: u64,
}

impl HitTableWriter {
    /// Creates a new table file, truncating any existing one.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written. This is
    /// fatal to the run.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        // Row count placeholder, fixed up by finish().
        writer.write_all(&0_u64.to_le_bytes())?;
        Ok(Self { writer, rows: 0 })
    }

    /// Appends one row.
    ///
    /// # Errors
    /// Returns an error on write failure, which is fatal to the run.
    pub fn append(&mut self, row: &AssembledRow) -> Result<()> {
        for value in [row.tp1, row.tp2, row.evn] {
            self.writer.write_all(&value.to_le_bytes())?;
        }
        for strip in row.b.iter().chain(row.a.iter()) {
            self.writer.write_all(&i64::from(*strip).to_le_bytes())?;
        }
        self.rows += 1;
        Ok(())
    }

    /// Number of rows appended so far.
    #[must_use]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Writes the final row count into the header and flushes.
    ///
    /// # Errors
    /// Returns an error on seek, write, or flush failure.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.seek(SeekFrom::Start(16))?;
        self.writer.write_all(&self.rows.to_le_bytes())?;
        self.writer.flush()?;
        Ok(self.rows)
    }
}

/// Read-only, memory-mapped view of a finished hit table.
#[derive(Debug)]
pub struct HitTable {
    mmap: Mmap,
    rows: usize,
}

impl HitTable {
    /// Opens and validates a table file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or mapped, or if the
    /// magic, version, or length do not match the declared row count. An
    /// absent table at reconstruction time is fatal.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and we assume it is not
        // modified concurrently. This is the standard safety contract for
        // memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < HEADER_LEN {
            return Err(Error::InvalidTable(format!(
                "file too short for header: {} bytes",
                mmap.len()
            )));
        }
        if &mmap[..8] != MAGIC {
            return Err(Error::InvalidTable("bad magic".into()));
        }
        let version = read_u64(&mmap, 8);
        if version != FORMAT_VERSION {
            return Err(Error::InvalidTable(format!(
                "unsupported format version {version}"
            )));
        }
        let rows = usize::try_from(read_u64(&mmap, 16))
            .map_err(|_| Error::InvalidTable("row count overflows usize".into()))?;
        let expected = HEADER_LEN + rows * ROW_LEN;
        if mmap.len() != expected {
            return Err(Error::InvalidTable(format!(
                "length {} does not match {rows} rows (expected {expected})",
                mmap.len()
            )));
        }
        Ok(Self { mmap, rows })
    }

    /// Number of rows in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns true if the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Random access by insertion ordinal.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<AssembledRow> {
        if index >= self.rows {
            return None;
        }
        let base = HEADER_LEN + index * ROW_LEN;
        let field = |k: usize| read_i64(&self.mmap, base + k * 8);
        let strip = |k: usize| clamp_strip(field(k));
        Some(AssembledRow {
            tp1: field(0),
            tp2: field(1),
            evn: field(2),
            b: [strip(3), strip(4), strip(5)],
            a: [strip(6), strip(7), strip(8)],
        })
    }

    /// Full scan in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = AssembledRow> + '_ {
        (0..self.rows).filter_map(move |i| self.row(i))
    }

    /// Scan yielding `(ordinal, row)` pairs, the shape the incidence and
    /// range queries consume.
    pub fn enumerate(&self) -> impl Iterator<Item = (usize, AssembledRow)> + '_ {
        (0..self.rows).filter_map(move |i| self.row(i).map(|row| (i, row)))
    }
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0_u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

fn read_i64(bytes: &[u8], offset: usize) -> i64 {
    let mut buf = [0_u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    i64::from_le_bytes(buf)
}

/// Strips are stored widened to i64; anything outside i32 can only come from
/// a corrupt file and is collapsed to the invalid sentinel.
fn clamp_strip(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(mutrack_core::INVALID_STRIP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_row(evn: i64) -> AssembledRow {
        AssembledRow {
            tp1: 100 + evn,
            tp2: 200 + evn,
            evn,
            b: [0, 5, 11],
            a: [3, -1, 9],
        }
    }

    #[test]
    fn test_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = HitTableWriter::create(file.path()).unwrap();
        for evn in 0..10 {
            writer.append(&sample_row(evn)).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), 10);

        let table = HitTable::open(file.path()).unwrap();
        assert_eq!(table.len(), 10);
        assert!(!table.is_empty());
        let rows: Vec<AssembledRow> = table.iter().collect();
        for (evn, row) in rows.iter().enumerate() {
            assert_eq!(*row, sample_row(evn as i64));
        }
    }

    #[test]
    fn test_random_access() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = HitTableWriter::create(file.path()).unwrap();
        for evn in 0..100 {
            writer.append(&sample_row(evn)).unwrap();
        }
        writer.finish().unwrap();

        let table = HitTable::open(file.path()).unwrap();
        assert_eq!(table.row(42).unwrap().evn, 42);
        assert_eq!(table.row(99).unwrap().tp1, 199);
        assert!(table.row(100).is_none());
    }

    #[test]
    fn test_empty_table() {
        let file = NamedTempFile::new().unwrap();
        HitTableWriter::create(file.path()).unwrap().finish().unwrap();
        let table = HitTable::open(file.path()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"NOTATBL!????????????????").unwrap();
        assert!(matches!(
            HitTable::open(file.path()).unwrap_err(),
            Error::InvalidTable(_)
        ));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = HitTableWriter::create(file.path()).unwrap();
        writer.append(&sample_row(1)).unwrap();
        writer.finish().unwrap();

        let mut bytes = std::fs::read(file.path()).unwrap();
        bytes.truncate(bytes.len() - 8);
        std::fs::write(file.path(), &bytes).unwrap();
        assert!(matches!(
            HitTable::open(file.path()).unwrap_err(),
            Error::InvalidTable(_)
        ));
    }

    #[test]
    fn test_unfinished_writer_leaves_zero_count() {
        let file = NamedTempFile::new().unwrap();
        {
            let mut writer = HitTableWriter::create(file.path()).unwrap();
            writer.append(&sample_row(1)).unwrap();
            // Dropped without finish(): header still claims zero rows, so
            // the length check refuses the file.
            drop(writer);
        }
        assert!(HitTable::open(file.path()).is_err());
    }
}
