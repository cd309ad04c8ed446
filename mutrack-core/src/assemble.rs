//! Hit filtering and cross-plane assembly.
//!
//! Filtering drops every record whose event number falls inside any detected
//! gap interval, from any plane. Assembly then pairs the surviving hits of
//! the three planes positionally: the j-th survivor of plane 1 joins the
//! j-th survivors of planes 2 and 3. Positional pairing assumes the three
//! planes keep equal counts in matching order after filtering; event numbers
//! are not re-checked here. See DESIGN.md for the rationale of keeping that
//! behavior.

use crate::decode::{decode_record, DecodedHit};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::record::{PlaneId, RawRecord};
use crate::sync::SyncReport;

/// One assembled triplet, the durable unit of the pipeline.
///
/// Timing and event identity come from plane 1. Strip arrays are indexed by
/// plane (bottom to top); `-1` marks an ambiguous axis. Rows are immutable
/// once appended to the hit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembledRow {
    /// First trigger timestamp (plane 1).
    pub tp1: i64,
    /// Second trigger timestamp (plane 1).
    pub tp2: i64,
    /// Event number (plane 1).
    pub evn: i64,
    /// B-axis strip per plane: `[B1, B2, B3]`.
    pub b: [i32; 3],
    /// A-axis strip per plane: `[A1, A2, A3]`.
    pub a: [i32; 3],
}

impl AssembledRow {
    /// Returns true if every strip index on both axes is valid.
    #[must_use]
    pub fn all_strips_valid(&self) -> bool {
        self.b.iter().chain(self.a.iter()).all(|&s| s >= 0)
    }
}

/// Decodes one plane's records, dropping excluded events and unreadable
/// strip words.
///
/// Records whose event number falls in any plane's exclusion interval are
/// silently skipped (that is the filter's job, not an anomaly). Records whose
/// hex word fails to parse are skipped with a warning diagnostic carrying the
/// line index and offending text.
pub fn decode_plane(
    records: &[RawRecord],
    report: &SyncReport,
    dataset: &str,
    plane: PlaneId,
    sink: &mut dyn DiagnosticSink,
) -> Vec<DecodedHit> {
    let mut hits = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        if report.excludes(record.evn) {
            continue;
        }
        match decode_record(record) {
            Ok(hit) => hits.push(hit),
            Err(err) => {
                sink.report(
                    Diagnostic::warning(dataset, format!("skipping record: {err}"))
                        .with_plane(plane)
                        .with_index(i),
                );
            }
        }
    }
    hits
}

/// Pairs the three planes' surviving hits positionally into rows.
///
/// Emits one row per index up to the shortest plane; if the counts differ,
/// the truncation point is reported and assembly continues with the rows
/// already formed.
pub fn assemble(
    planes: [&[DecodedHit]; 3],
    dataset: &str,
    sink: &mut dyn DiagnosticSink,
) -> Vec<AssembledRow> {
    let shortest = planes.iter().map(|p| p.len()).min().unwrap_or(0);
    let longest = planes.iter().map(|p| p.len()).max().unwrap_or(0);
    if shortest != longest {
        sink.report(
            Diagnostic::warning(
                dataset,
                format!(
                    "plane hit counts differ ({}, {}, {}); truncating at {shortest}",
                    planes[0].len(),
                    planes[1].len(),
                    planes[2].len()
                ),
            )
            .with_index(shortest),
        );
    }

    (0..shortest)
        .map(|j| {
            let lead = &planes[0][j];
            AssembledRow {
                tp1: lead.tp1,
                tp2: lead.tp2,
                evn: lead.evn,
                b: [planes[0][j].b, planes[1][j].b, planes[2][j].b],
                a: [planes[0][j].a, planes[1][j].a, planes[2][j].a],
            }
        })
        .collect()
}

/// Full per-dataset assembly: filter and decode each plane, then pair.
pub fn build_rows(
    planes: [&[RawRecord]; 3],
    report: &SyncReport,
    dataset: &str,
    sink: &mut dyn DiagnosticSink,
) -> Vec<AssembledRow> {
    let decoded: Vec<Vec<DecodedHit>> = PlaneId::ALL
        .iter()
        .map(|&plane| decode_plane(planes[plane.index()], report, dataset, plane, sink))
        .collect();
    assemble([&decoded[0], &decoded[1], &decoded[2]], dataset, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::encode_strips;
    use crate::diagnostics::{CollectingSink, Severity};
    use crate::sync::{synchronize, ExclusionInterval};

    fn record(evn: i64, b: u32, a: u32) -> RawRecord {
        let word = encode_strips(b, a).unwrap();
        RawRecord::parse(&format!(
            "{evn},{:02X},{:02X},{:02X},{evn},{evn}",
            word >> 16,
            (word >> 8) & 0xFF,
            word & 0xFF
        ))
        .unwrap()
    }

    fn report_with(intervals: Vec<ExclusionInterval>) -> SyncReport {
        let mut report = SyncReport::default();
        report.intervals[1] = intervals;
        report
    }

    #[test]
    fn test_exclusion_bounds_inclusive() {
        let report = report_with(vec![ExclusionInterval::new(6, 8)]);
        let records: Vec<RawRecord> = [5, 6, 7, 8, 9].map(|evn| record(evn, 1, 1)).to_vec();
        let mut sink = CollectingSink::new();
        let hits = decode_plane(&records, &report, "ds", PlaneId::P1, &mut sink);
        let surviving: Vec<i64> = hits.iter().map(|h| h.evn).collect();
        assert_eq!(surviving, vec![5, 9]);
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn test_bad_hex_skipped_with_diagnostic() {
        let mut records = vec![record(1, 0, 0), record(2, 1, 1)];
        records[0].hex[1] = "xx".to_owned();
        let report = SyncReport::default();
        let mut sink = CollectingSink::new();
        let hits = decode_plane(&records, &report, "ds", PlaneId::P3, &mut sink);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].evn, 2);
        assert_eq!(sink.count(Severity::Warning), 1);
        assert_eq!(sink.diagnostics[0].index, Some(0));
    }

    #[test]
    fn test_assembly_uses_plane1_identity() {
        let p1 = [DecodedHit { evn: 10, tp1: 1, tp2: 2, b: 3, a: 4 }];
        let p2 = [DecodedHit { evn: 99, tp1: 7, tp2: 8, b: 5, a: 6 }];
        let p3 = [DecodedHit { evn: 98, tp1: 9, tp2: 9, b: 7, a: 8 }];
        let mut sink = CollectingSink::new();
        let rows = assemble([&p1, &p2, &p3], "ds", &mut sink);
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].tp1, rows[0].tp2, rows[0].evn), (1, 2, 10));
        assert_eq!(rows[0].b, [3, 5, 7]);
        assert_eq!(rows[0].a, [4, 6, 8]);
    }

    #[test]
    fn test_assembly_truncates_to_shortest() {
        let hit = DecodedHit { evn: 1, tp1: 0, tp2: 0, b: 0, a: 0 };
        let p1 = [hit, hit, hit];
        let p2 = [hit, hit];
        let p3 = [hit, hit, hit];
        let mut sink = CollectingSink::new();
        let rows = assemble([&p1, &p2, &p3], "ds", &mut sink);
        assert_eq!(rows.len(), 2);
        assert_eq!(sink.count(Severity::Warning), 1);
        assert_eq!(sink.diagnostics[0].index, Some(2));
    }

    #[test]
    fn test_gap_on_one_plane_filters_all_planes() {
        // Plane 2 skips events 3: sequence 1,2,4,5.
        let p1: Vec<RawRecord> = [1, 2, 3, 4, 5].map(|e| record(e, 2, 2)).to_vec();
        let p2: Vec<RawRecord> = [1, 2, 4, 5].map(|e| record(e, 3, 3)).to_vec();
        let p3: Vec<RawRecord> = [1, 2, 3, 4, 5].map(|e| record(e, 4, 4)).to_vec();
        let mut sink = CollectingSink::new();
        let report = synchronize([&p1, &p2, &p3], "ds", &mut sink);
        assert_eq!(report.intervals[1], vec![ExclusionInterval::new(2, 4)]);

        let rows = build_rows([&p1, &p2, &p3], &report, "ds", &mut sink);
        let evns: Vec<i64> = rows.iter().map(|r| r.evn).collect();
        assert_eq!(evns, vec![1, 5]);
    }

    #[test]
    fn test_all_strips_valid() {
        let mut row = AssembledRow {
            tp1: 0,
            tp2: 0,
            evn: 0,
            b: [0, 5, 11],
            a: [1, 2, 3],
        };
        assert!(row.all_strips_valid());
        row.a[2] = -1;
        assert!(!row.all_strips_valid());
    }
}
