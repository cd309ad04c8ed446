//! Geometric quality cuts for three-point trajectories.
//!
//! Two independent cuts run in physical, plate-centered coordinates: the
//! maximum transverse residual against the fitted line, and the 3-D kink
//! angle between the upper (plane 3 to plane 2) and lower (plane 2 to
//! plane 1) segments. Both must pass for acceptance. Accepted rows yield a
//! sampled polyline for downstream rendering; rendering itself lives outside
//! this crate.

use crate::assemble::AssembledRow;
use crate::fit::TrajectoryFitter;
use crate::geometry::Geometry;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Tolerances and sampling for the quality cuts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Maximum transverse residual in cm.
    pub residual_tolerance_cm: f64,
    /// Maximum kink angle in degrees.
    pub angle_tolerance_deg: f64,
    /// Sample count for accepted-event polylines.
    pub polyline_samples: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            residual_tolerance_cm: 1.0,
            angle_tolerance_deg: 5.0,
            polyline_samples: 200,
        }
    }
}

/// Outcome of the quality cuts for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Both cuts passed.
    Accepted,
    /// The row carries a `-1` strip and cannot be placed in physical space.
    InvalidStrip,
    /// Maximum residual in cm exceeded the tolerance.
    ResidualExceeded(f64),
    /// Kink angle in degrees exceeded the tolerance.
    KinkExceeded(f64),
}

impl Verdict {
    /// Returns true for [`Verdict::Accepted`].
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Smoothed trajectory samples for one accepted event, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    /// x samples in cm.
    pub xs: Vec<f64>,
    /// y samples in cm.
    pub ys: Vec<f64>,
    /// z samples in cm.
    pub zs: Vec<f64>,
}

/// Applies residual and kink-angle cuts in physical coordinates.
#[derive(Debug, Clone)]
pub struct QualityFilter {
    geometry: Geometry,
    fitter: TrajectoryFitter,
    config: QualityConfig,
}

impl QualityFilter {
    /// Creates a filter for the given geometry and tolerances.
    ///
    /// # Errors
    /// Returns an error if the geometry's depths are degenerate.
    pub fn new(geometry: Geometry, config: QualityConfig) -> Result<Self> {
        let fitter = TrajectoryFitter::new(geometry.plane_depths_cm)?;
        Ok(Self {
            geometry,
            fitter,
            config,
        })
    }

    /// Physical (x, y) coordinates of the row's three hits, bottom to top.
    fn physical_points(&self, row: &AssembledRow) -> ([f64; 3], [f64; 3]) {
        let xs = row.b.map(|s| self.geometry.strip_to_centered_cm(s));
        let ys = row.a.map(|s| self.geometry.strip_to_centered_cm(s));
        (xs, ys)
    }

    /// Runs both cuts on one row.
    #[must_use]
    pub fn check(&self, row: &AssembledRow) -> Verdict {
        if !row.all_strips_valid() {
            return Verdict::InvalidStrip;
        }
        let (xs, ys) = self.physical_points(row);
        let z = self.fitter.depths();
        let fit_x = self.fitter.fit_axis(xs);
        let fit_y = self.fitter.fit_axis(ys);

        let max_residual = (0..3)
            .map(|k| {
                let dx = xs[k] - fit_x.at(z[k]);
                let dy = ys[k] - fit_y.at(z[k]);
                dx.hypot(dy)
            })
            .fold(0.0_f64, f64::max);
        if max_residual > self.config.residual_tolerance_cm {
            return Verdict::ResidualExceeded(max_residual);
        }

        let kink = kink_angle_deg(&xs, &ys, &z);
        if kink > self.config.angle_tolerance_deg {
            return Verdict::KinkExceeded(kink);
        }
        Verdict::Accepted
    }

    /// Returns the sampled fitted polyline for an accepted row, or `None`
    /// when either cut rejects it.
    #[must_use]
    pub fn polyline(&self, row: &AssembledRow) -> Option<Polyline> {
        if !self.check(row).is_accepted() {
            return None;
        }
        let (xs, ys) = self.physical_points(row);
        let fit_x = self.fitter.fit_axis(xs);
        let fit_y = self.fitter.fit_axis(ys);
        let z = self.fitter.depths();
        let (z_top, z_bottom) = (z[2], z[0]);

        let n = self.config.polyline_samples.max(2);
        let step = (z_bottom - z_top) / (n - 1) as f64;
        let zs: Vec<f64> = (0..n).map(|k| z_top + step * k as f64).collect();
        Some(Polyline {
            xs: zs.iter().map(|&zk| fit_x.at(zk)).collect(),
            ys: zs.iter().map(|&zk| fit_y.at(zk)).collect(),
            zs,
        })
    }
}

/// 3-D angle in degrees between the plane3->plane2 and plane2->plane1
/// segments, with the cosine clamped into [-1, 1].
fn kink_angle_deg(xs: &[f64; 3], ys: &[f64; 3], z: &[f64; 3]) -> f64 {
    let v = [xs[1] - xs[2], ys[1] - ys[2], z[1] - z[2]];
    let w = [xs[0] - xs[1], ys[0] - ys[1], z[0] - z[1]];
    let dot = v[0] * w[0] + v[1] * w[1] + v[2] * w[2];
    let norm_v = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    let norm_w = (w[0] * w[0] + w[1] * w[1] + w[2] * w[2]).sqrt();
    let cos = (dot / (norm_v * norm_w)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
