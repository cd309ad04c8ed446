//! Two-plane incidence-angle exploration.
//!
//! Given one target coordinate on the middle plane, this scans the hit table
//! for events that crossed it and computes the incidence angle of each from
//! the matching bottom-plane hit: `theta = atan2(sqrt(dx^2 + dy^2), h)` with
//! the transverse deltas in physical units and `h` the plane-1 to plane-2
//! spacing. With at least two matches, a least-squares line through the
//! bottom-plane points gives an aggregate direction. This is the exploration
//! counterpart of the bulk three-plane fit, not part of ingestion.

use crate::assemble::AssembledRow;
use crate::decode::STRIPS_PER_AXIS;
use crate::geometry::Geometry;
use crate::{Error, Result};

/// Validated target coordinate on the middle plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCoordinate {
    a: i32,
    b: i32,
}

impl TargetCoordinate {
    /// Creates a target coordinate after bounds-checking both indices.
    ///
    /// # Errors
    /// Returns an error if either index is outside `[0, 11]`. The caller
    /// reports it and aborts the operation with no output.
    pub fn new(a: i64, b: i64) -> Result<Self> {
        let limit = i64::from(STRIPS_PER_AXIS);
        for index in [a, b] {
            if !(0..limit).contains(&index) {
                return Err(Error::StripIndexOutOfRange(index, STRIPS_PER_AXIS - 1));
            }
        }
        Ok(Self {
            a: a as i32,
            b: b as i32,
        })
    }

    /// A-axis strip index.
    #[must_use]
    pub fn a(&self) -> i32 {
        self.a
    }

    /// B-axis strip index.
    #[must_use]
    pub fn b(&self) -> i32 {
        self.b
    }
}

/// Validated inclusive row-ordinal range over the hit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    /// First row ordinal.
    pub start: usize,
    /// Last row ordinal, inclusive.
    pub end: usize,
}

impl RowRange {
    /// Creates a range after checking ordering and table bounds.
    ///
    /// # Errors
    /// Returns an error for an inverted range or an `end` past the table.
    pub fn new(start: usize, end: usize, rows: usize) -> Result<Self> {
        if start > end || end >= rows {
            return Err(Error::InvalidRowRange { start, end, rows });
        }
        Ok(Self { start, end })
    }

    /// Number of rows covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; a valid range covers at least one row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// One event whose middle-plane hit matched the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidenceMatch {
    /// Table row ordinal.
    pub row: usize,
    /// Bottom-plane A strip.
    pub a1: i32,
    /// Bottom-plane B strip.
    pub b1: i32,
    /// Incidence angle from vertical in degrees.
    pub theta_deg: f64,
}

/// Least-squares line through the matched bottom-plane points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointFit {
    /// Slope of y against x in the bottom plane.
    pub slope: f64,
    /// Intercept in cm.
    pub intercept_cm: f64,
    /// Aggregate incidence angle in degrees derived from the fit.
    pub theta_deg: f64,
}

/// Result of one incidence scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidenceSummary {
    /// Per-event matches in scan order.
    pub matches: Vec<IncidenceMatch>,
    /// Aggregate fit, present with two or more matches.
    pub fit: Option<PointFit>,
}

/// Scans `(ordinal, row)` pairs for middle-plane hits at `target`.
///
/// Rows with any invalid strip on planes 1 or 2 are skipped; the top plane
/// does not participate in this two-plane mode.
#[must_use]
pub fn incidence_scan<I>(rows: I, target: TargetCoordinate, geometry: &Geometry) -> IncidenceSummary
where
    I: IntoIterator<Item = (usize, AssembledRow)>,
{
    let pitch = geometry.pitch_cm();
    let spacing = geometry.lower_spacing_cm();
    let in_range = |s: i32| (0..STRIPS_PER_AXIS as i32).contains(&s);

    let mut matches = Vec::new();
    for (ordinal, row) in rows {
        let (a1, b1, a2, b2) = (row.a[0], row.b[0], row.a[1], row.b[1]);
        if !(in_range(a1) && in_range(b1) && in_range(a2) && in_range(b2)) {
            continue;
        }
        if a2 != target.a || b2 != target.b {
            continue;
        }
        let dx = f64::from(a2 - a1) * pitch;
        let dy = f64::from(b2 - b1) * pitch;
        let theta_deg = dx.hypot(dy).atan2(spacing).to_degrees();
        matches.push(IncidenceMatch {
            row: ordinal,
            a1,
            b1,
            theta_deg,
        });
    }

    let fit = fit_points(&matches, pitch, spacing);
    IncidenceSummary { matches, fit }
}

/// Least-squares `y = m x + c` over the matched bottom-plane points, in cm.
///
/// Needs at least two points and non-degenerate x spread. The aggregate
/// angle follows the source analysis: `atan2(pitch * sqrt(1 + m^2), h)`.
fn fit_points(matches: &[IncidenceMatch], pitch: f64, spacing: f64) -> Option<PointFit> {
    if matches.len() < 2 {
        return None;
    }
    let n = matches.len() as f64;
    let xs: Vec<f64> = matches.iter().map(|m| f64::from(m.a1) * pitch).collect();
    let ys: Vec<f64> = matches.iter().map(|m| f64::from(m.b1) * pitch).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;
    let denom: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
    if denom <= 0.0 {
        return None;
    }
    let cov: f64 = xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    let slope = cov / denom;
    let intercept_cm = y_mean - slope * x_mean;
    let theta_deg = (pitch * (1.0 + slope * slope).sqrt())
        .atan2(spacing)
        .to_degrees();
    Some(PointFit {
        slope,
        intercept_cm,
        theta_deg,
    })
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
    fn test_target_validation() {
        assert!(TargetCoordinate::new(0, 11).is_ok());
        assert!(TargetCoordinate::new(12, 0).is_err());
        assert!(TargetCoordinate::new(0, -1).is_err());
    }

    #[test]
    fn test_row_range_validation() {
        assert!(RowRange::new(0, 9, 10).is_ok());
        assert_eq!(RowRange::new(2, 5, 10).unwrap().len(), 4);
        assert!(RowRange::new(5, 2, 10).is_err());
        assert!(RowRange::new(0, 10, 10).is_err());
    }

    #[test]
    fn test_straight_through_hit_has_zero_angle() {
        let geometry = Geometry::default();
        let target = TargetCoordinate::new(6, 6).unwrap();
        let rows = vec![(0, row([6, 6, 6], [6, 6, 6]))];
        let summary = incidence_scan(rows, target, &geometry);
        assert_eq!(summary.matches.len(), 1);
        assert_relative_eq!(summary.matches[0].theta_deg, 0.0, epsilon = 1e-12);
        assert!(summary.fit.is_none());
    }

    #[test]
    fn test_oblique_hit_angle() {
        let geometry = Geometry::default();
        let target = TargetCoordinate::new(6, 6).unwrap();
        // One strip off on each axis at the bottom plane.
        let rows = vec![(3, row([5, 6, 0], [5, 6, 0]))];
        let summary = incidence_scan(rows, target, &geometry);
        assert_eq!(summary.matches.len(), 1);
        let expected = (3.0_f64.hypot(3.0))
            .atan2(geometry.lower_spacing_cm())
            .to_degrees();
        assert_relative_eq!(summary.matches[0].theta_deg, expected, epsilon = 1e-12);
        assert_eq!(summary.matches[0].row, 3);
    }

    #[test]
    fn test_non_matching_and_invalid_rows_skipped() {
        let geometry = Geometry::default();
        let target = TargetCoordinate::new(6, 6).unwrap();
        let rows = vec![
            (0, row([6, 5, 0], [6, 6, 0])), // wrong b2
            (1, row([-1, 6, 0], [6, 6, 0])), // invalid b1
            (2, row([6, 6, 0], [6, 6, 0])), // match
        ];
        let summary = incidence_scan(rows, target, &geometry);
        assert_eq!(summary.matches.len(), 1);
        assert_eq!(summary.matches[0].row, 2);
    }

    #[test]
    fn test_aggregate_fit_over_two_points() {
        let geometry = Geometry::default();
        let target = TargetCoordinate::new(6, 6).unwrap();
        let rows = vec![
            (0, row([4, 6, 0], [4, 6, 0])),
            (1, row([8, 6, 0], [8, 6, 0])),
        ];
        let summary = incidence_scan(rows, target, &geometry);
        let fit = summary.fit.unwrap();
        // Points (4,4) and (8,8) in strip units: slope 1 through the origin.
        assert_relative_eq!(fit.slope, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept_cm, 0.0, epsilon = 1e-9);
        let expected = (geometry.pitch_cm() * 2.0_f64.sqrt())
            .atan2(geometry.lower_spacing_cm())
            .to_degrees();
        assert_relative_eq!(fit.theta_deg, expected, epsilon = 1e-12);
    }
}
