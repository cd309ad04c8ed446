//! Telescope geometry configuration.
//!
//! The three plane depths are fixed installation constants, never derived
//! from data. Defaults match the deployed telescope: plates of 36 cm with 12
//! strips per axis, planes at z = 0, 62.2 and 124.7 cm bottom to top.

use crate::decode::STRIPS_PER_AXIS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Fixed telescope geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Plane depths in cm, ascending bottom to top.
    pub plane_depths_cm: [f64; 3],
    /// Transverse plate width in cm.
    pub plate_width_cm: f64,
    /// Strips per transverse axis.
    pub strips_per_axis: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            plane_depths_cm: [0.0, 62.2, 124.7],
            plate_width_cm: 36.0,
            strips_per_axis: STRIPS_PER_AXIS,
        }
    }
}

impl Geometry {
    /// Loads geometry from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.as_ref().display())))?;
        let geometry: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Config(e.to_string()))?;
        geometry.validate()?;
        Ok(geometry)
    }

    /// Loads geometry from a JSON string. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error on invalid JSON or failed validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let geometry: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        geometry.validate()?;
        Ok(geometry)
    }

    /// Checks depth ordering and positive dimensions.
    ///
    /// # Errors
    /// Returns an error if depths are not strictly ascending, the plate width
    /// is not positive, or the strip count is zero.
    pub fn validate(&self) -> Result<()> {
        let [z1, z2, z3] = self.plane_depths_cm;
        if !(z1 < z2 && z2 < z3) {
            return Err(Error::Config(format!(
                "plane depths must be strictly ascending, got [{z1}, {z2}, {z3}]"
            )));
        }
        if self.plate_width_cm <= 0.0 {
            return Err(Error::Config(format!(
                "plate width must be positive, got {}",
                self.plate_width_cm
            )));
        }
        if self.strips_per_axis == 0 {
            return Err(Error::Config("strips per axis must be non-zero".into()));
        }
        Ok(())
    }

    /// Strip pitch in cm: plate width over strip count.
    #[inline]
    #[must_use]
    pub fn pitch_cm(&self) -> f64 {
        self.plate_width_cm / f64::from(self.strips_per_axis)
    }

    /// Maps a strip index to a plate-centered physical coordinate in cm.
    ///
    /// Strip centers are spaced one pitch apart with the plate center at
    /// zero, so index 0 maps to `-(n-1)/2 * pitch` and index `n-1` to its
    /// mirror image.
    #[inline]
    #[must_use]
    pub fn strip_to_centered_cm(&self, index: i32) -> f64 {
        let offset = f64::from(self.strips_per_axis - 1) / 2.0 * self.pitch_cm();
        f64::from(index) * self.pitch_cm() - offset
    }

    /// Vertical spacing between planes 1 and 2 in cm.
    #[inline]
    #[must_use]
    pub fn lower_spacing_cm(&self) -> f64 {
        self.plane_depths_cm[1] - self.plane_depths_cm[0]
    }
}
