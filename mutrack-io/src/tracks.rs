//! Track and polyline output files.

use crate::Result;
use mutrack_core::{Polyline, TrackFit};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for reconstructed track data.
pub struct TrackWriter {
    writer: BufWriter<File>,
}

impl TrackWriter {
    /// Creates a new output file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Writes the per-event fit table as CSV, one row per source table row.
    ///
    /// # Errors
    /// Returns an error on write failure.
    pub fn write_fits_csv(&mut self, fits: &[TrackFit]) -> Result<()> {
        writeln!(self.writer, "slope_x,slope_y,theta_x_deg,theta_y_deg")?;
        for fit in fits {
            writeln!(
                self.writer,
                "{},{},{},{}",
                fit.slope_x, fit.slope_y, fit.theta_x_deg, fit.theta_y_deg
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Writes accepted-event polylines as long-format CSV with one sample
    /// per line, keyed by the source row ordinal.
    ///
    /// # Errors
    /// Returns an error on write failure.
    pub fn write_polylines_csv<'a, I>(&mut self, polylines: I) -> Result<()>
    where
        I: IntoIterator<Item = (usize, &'a Polyline)>,
    {
        writeln!(self.writer, "event,x,y,z")?;
        for (event, line) in polylines {
            for ((x, y), z) in line.xs.iter().zip(&line.ys).zip(&line.zs) {
                writeln!(self.writer, "{event},{x},{y},{z}")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_fits_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = TrackWriter::create(file.path()).unwrap();
        let fits = vec![
            TrackFit {
                slope_x: 0.1,
                slope_y: 0.0,
                theta_x_deg: 5.710_593_137_499_643,
                theta_y_deg: 0.0,
            },
            TrackFit {
                slope_x: -0.5,
                slope_y: 1.0,
                theta_x_deg: -26.565_051_177_077_99,
                theta_y_deg: 45.0,
            },
        ];
        writer.write_fits_csv(&fits).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("slope_x,slope_y,theta_x_deg,theta_y_deg"));
        assert!(lines.next().unwrap().starts_with("0.1,0,"));
        assert!(content.lines().last().unwrap().ends_with(",45"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_write_polylines_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = TrackWriter::create(file.path()).unwrap();
        let line = Polyline {
            xs: vec![1.0, 2.0],
            ys: vec![3.0, 4.0],
            zs: vec![124.7, 0.0],
        };
        writer.write_polylines_csv([(7, &line)]).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "event,x,y,z\n7,1,3,124.7\n7,2,4,0\n"
        );
    }
}
