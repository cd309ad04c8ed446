//! Cross-plane event-number synchronization.
//!
//! Each plane's readout numbers its triggers independently. A jump in the
//! sequence means that plane dropped triggers, so the affected event range is
//! unreliable for the whole telescope. Gaps are recorded as data
//! ([`ExclusionInterval`]), not treated as errors.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::record::{PlaneId, RawRecord};

/// Inclusive event-number range flagged as unreliable on one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionInterval {
    /// Last event number before the gap.
    pub start: i64,
    /// First event number after the gap.
    pub end: i64,
}

impl ExclusionInterval {
    /// Creates an interval. Bounds are inclusive at both ends.
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Returns true if `evn` falls inside this interval, bounds included.
    #[inline]
    #[must_use]
    pub fn contains(&self, evn: i64) -> bool {
        evn >= self.start && evn <= self.end
    }
}

/// Result of synchronizing one dataset's three plane sequences.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Detected gap intervals per plane, in discovery order, unmerged.
    pub intervals: [Vec<ExclusionInterval>; 3],
}

impl SyncReport {
    /// Returns true if `evn` falls inside any interval of any plane.
    ///
    /// A gap on one plane invalidates the corresponding triplet on every
    /// plane, so filtering always applies the union.
    #[must_use]
    pub fn excludes(&self, evn: i64) -> bool {
        self.intervals
            .iter()
            .flatten()
            .any(|interval| interval.contains(evn))
    }

    /// Total number of recorded intervals across all planes.
    #[must_use]
    pub fn interval_count(&self) -> usize {
        self.intervals.iter().map(Vec::len).sum()
    }
}

/// Scans one plane's sequence for event-number discontinuities.
///
/// Records `[evn[i], evn[i+1]]` for every consecutive pair that is not
/// numbered consecutively, and reports each gap with the line index of the
/// first record of the pair. Planes with fewer than two records produce no
/// intervals.
pub fn scan_gaps(
    records: &[RawRecord],
    dataset: &str,
    plane: PlaneId,
    sink: &mut dyn DiagnosticSink,
) -> Vec<ExclusionInterval> {
    let mut intervals = Vec::new();
    for (i, pair) in records.windows(2).enumerate() {
        if pair[0].evn + 1 != pair[1].evn {
            let interval = ExclusionInterval::new(pair[0].evn, pair[1].evn);
            sink.report(
                Diagnostic::warning(
                    dataset,
                    format!("event gap: {} -> {}", interval.start, interval.end),
                )
                .with_plane(plane)
                .with_index(i),
            );
            intervals.push(interval);
        }
    }
    intervals
}

/// Synchronizes the three plane sequences of one dataset.
///
/// Runs the per-plane gap scan, then cross-checks the first and last event
/// numbers across planes. A mismatch is informational only; no corrective
/// action is taken.
pub fn synchronize(
    planes: [&[RawRecord]; 3],
    dataset: &str,
    sink: &mut dyn DiagnosticSink,
) -> SyncReport {
    let mut report = SyncReport::default();
    for plane in PlaneId::ALL {
        report.intervals[plane.index()] = scan_gaps(planes[plane.index()], dataset, plane, sink);
    }
    check_alignment(planes, dataset, sink);
    report
}

/// Compares first and last event numbers across the three planes.
pub fn check_alignment(planes: [&[RawRecord]; 3], dataset: &str, sink: &mut dyn DiagnosticSink) {
    if let (Some(a), Some(b), Some(c)) = (planes[0].first(), planes[1].first(), planes[2].first()) {
        if !(a.evn == b.evn && b.evn == c.evn) {
            sink.report(Diagnostic::info(
                dataset,
                format!(
                    "first event numbers differ across planes: {}, {}, {}",
                    a.evn, b.evn, c.evn
                ),
            ));
        }
    }
    if let (Some(a), Some(b), Some(c)) = (planes[0].last(), planes[1].last(), planes[2].last()) {
        if !(a.evn == b.evn && b.evn == c.evn) {
            sink.report(Diagnostic::info(
                dataset,
                format!(
                    "last event numbers differ across planes: {}, {}, {}",
                    a.evn, b.evn, c.evn
                ),
            ));
        }
    }
}
