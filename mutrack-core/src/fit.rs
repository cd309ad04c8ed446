//! Closed-form trajectory fitting.
//!
//! The three plane depths are identical for every event, so the least-squares
//! line through three points reduces to a closed form: the z mean and the
//! denominator `sum((z_k - z_mean)^2)` are computed once, and each axis of
//! each event costs a handful of multiplications.

use crate::assemble::AssembledRow;
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Fitted line along one transverse axis: `coord = slope * z + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    /// Slope with respect to z.
    pub slope: f64,
    /// Coordinate at z = 0.
    pub intercept: f64,
}

impl LineFit {
    /// Evaluates the fitted coordinate at depth `z`.
    #[inline]
    #[must_use]
    pub fn at(&self, z: f64) -> f64 {
        self.slope * z + self.intercept
    }

    /// Inclination of the fitted line in degrees.
    #[inline]
    #[must_use]
    pub fn theta_deg(&self) -> f64 {
        self.slope.atan().to_degrees()
    }
}

/// Per-event fit result, derived from a table row and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackFit {
    /// Slope of the B-axis (x) projection.
    pub slope_x: f64,
    /// Slope of the A-axis (y) projection.
    pub slope_y: f64,
    /// x-z inclination in degrees.
    pub theta_x_deg: f64,
    /// y-z inclination in degrees.
    pub theta_y_deg: f64,
}

/// Configuration for bulk fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitterConfig {
    /// Fit rows in parallel. Row order is preserved either way.
    pub parallel: bool,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Closed-form least-squares fitter over three fixed depths.
#[derive(Debug, Clone)]
pub struct TrajectoryFitter {
    z: [f64; 3],
    z_mean: f64,
    denom: f64,
    config: FitterConfig,
}

impl TrajectoryFitter {
    /// Creates a fitter for the given ascending plane depths.
    ///
    /// # Errors
    /// Returns an error if the depths are degenerate (all equal), which would
    /// make the closed form divide by zero.
    pub fn new(z: [f64; 3]) -> Result<Self> {
        let z_mean = (z[0] + z[1] + z[2]) / 3.0;
        let denom: f64 = z.iter().map(|&zk| (zk - z_mean).powi(2)).sum();
        if denom <= 0.0 {
            return Err(Error::Config(format!(
                "degenerate plane depths [{}, {}, {}]",
                z[0], z[1], z[2]
            )));
        }
        Ok(Self {
            z,
            z_mean,
            denom,
            config: FitterConfig::default(),
        })
    }

    /// Sets the bulk-fitting configuration.
    #[must_use]
    pub fn with_config(mut self, config: FitterConfig) -> Self {
        self.config = config;
        self
    }

    /// Plane depths this fitter was built for.
    #[must_use]
    pub fn depths(&self) -> [f64; 3] {
        self.z
    }

    /// Fits one transverse axis: `slope = cov(z, c) / var(z)`.
    #[must_use]
    pub fn fit_axis(&self, coords: [f64; 3]) -> LineFit {
        let c_mean = (coords[0] + coords[1] + coords[2]) / 3.0;
        let cov: f64 = self
            .z
            .iter()
            .zip(coords.iter())
            .map(|(&zk, &ck)| (zk - self.z_mean) * (ck - c_mean))
            .sum();
        let slope = cov / self.denom;
        LineFit {
            slope,
            intercept: c_mean - slope * self.z_mean,
        }
    }

    /// Fits both axes of one row using raw strip indices as coordinates.
    ///
    /// B strips project onto x, A strips onto y. Invalid (`-1`) strips are
    /// fitted as-is; downstream quality cuts are responsible for rejecting
    /// rows that carry the sentinel.
    #[must_use]
    pub fn fit_row(&self, row: &AssembledRow) -> TrackFit {
        let x = self.fit_axis(row.b.map(f64::from));
        let y = self.fit_axis(row.a.map(f64::from));
        TrackFit {
            slope_x: x.slope,
            slope_y: y.slope,
            theta_x_deg: x.theta_deg(),
            theta_y_deg: y.theta_deg(),
        }
    }

    /// Fits every row, one [`TrackFit`] per input row in the same order.
    ///
    /// Uses rayon when configured; rows are independent and the indexed
    /// parallel map preserves ordering.
    #[must_use]
    pub fn fit_rows(&self, rows: &[AssembledRow]) -> Vec<TrackFit> {
        if self.config.parallel {
            rows.par_iter().map(|row| self.fit_row(row)).collect()
        } else {
            rows.iter().map(|row| self.fit_row(row)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(b: [i32; 3], a: [i32; 3]) -> AssembledRow {
        AssembledRow {
            tp1: 0,
            tp2: 0,
            evn: 0,
            b,
            a,
        }
    }

    #[test]
    fn test_collinear_fit_exact() {
        let fitter = TrajectoryFitter::new([0.0, 10.0, 20.0]).unwrap();
        let fit = fitter.fit_axis([0.0, 1.0, 2.0]);
        assert_relative_eq!(fit.slope, 0.1, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 0.0, epsilon = 1e-12);
        for (zk, ck) in [(0.0, 0.0), (10.0, 1.0), (20.0, 2.0)] {
            assert_relative_eq!(fit.at(zk), ck, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_theta_conversion() {
        let flat = LineFit {
            slope: 0.0,
            intercept: 3.0,
        };
        assert_relative_eq!(flat.theta_deg(), 0.0, epsilon = 1e-6);
        let diagonal = LineFit {
            slope: 1.0,
            intercept: 0.0,
        };
        assert_relative_eq!(diagonal.theta_deg(), 45.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fit_row_axis_assignment() {
        let fitter = TrajectoryFitter::new([0.0, 10.0, 20.0]).unwrap();
        let fit = fitter.fit_row(&row([0, 1, 2], [5, 5, 5]));
        assert_relative_eq!(fit.slope_x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(fit.slope_y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(fit.theta_y_deg, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_collinear_least_squares() {
        // Points (0,0), (10,1), (20,0): symmetric, so slope must be zero and
        // the intercept the coordinate mean.
        let fitter = TrajectoryFitter::new([0.0, 10.0, 20.0]).unwrap();
        let fit = fitter.fit_axis([0.0, 1.0, 0.0]);
        assert_relative_eq!(fit.slope, 0.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let fitter = TrajectoryFitter::new([0.0, 62.2, 124.7]).unwrap();
        let rows: Vec<AssembledRow> = (0..64)
            .map(|i| row([i % 12, (i + 1) % 12, (i + 2) % 12], [(i + 3) % 12, i % 12, 5]))
            .collect();
        let sequential = fitter
            .clone()
            .with_config(FitterConfig { parallel: false })
            .fit_rows(&rows);
        let parallel = fitter.fit_rows(&rows);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_degenerate_depths_rejected() {
        assert!(TrajectoryFitter::new([5.0, 5.0, 5.0]).is_err());
    }
}
