//! Batch ingestion: datasets in, hit table out.
//!
//! One run opens the table writer exactly once, processes every discovered
//! dataset sequentially to completion, and finalizes the table at the end.
//! Everything below the writer recovers locally: unreadable plane files skip
//! their dataset, bad lines and bad hit words skip themselves.

use crate::dataset::{discover, read_plane, Dataset, NamingScheme};
use crate::table::HitTableWriter;
use crate::Result;
use mutrack_core::{build_rows, synchronize, Diagnostic, DiagnosticSink, PlaneId, RawRecord};
use std::path::Path;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Datasets fully processed.
    pub datasets: usize,
    /// Datasets skipped because a plane file could not be read.
    pub skipped_datasets: usize,
    /// Rows appended to the table.
    pub rows: u64,
}

/// Processes one dataset and appends its rows to the table.
///
/// # Errors
/// Returns an error only for table write failures; plane read failures are
/// reported through the sink and surface as `Ok(None)`.
pub fn ingest_dataset(
    dataset: &Dataset,
    writer: &mut HitTableWriter,
    sink: &mut dyn DiagnosticSink,
) -> Result<Option<u64>> {
    let mut planes: Vec<Vec<RawRecord>> = Vec::with_capacity(3);
    for plane in PlaneId::ALL {
        match read_plane(&dataset.files[plane.index()], &dataset.id, plane, sink) {
            Ok(records) => planes.push(records),
            Err(err) => {
                sink.report(
                    Diagnostic::error(&dataset.id, format!("unreadable plane file: {err}"))
                        .with_plane(plane),
                );
                return Ok(None);
            }
        }
    }

    let views = [planes[0].as_slice(), planes[1].as_slice(), planes[2].as_slice()];
    let report = synchronize(views, &dataset.id, sink);
    let rows = build_rows(views, &report, &dataset.id, sink);
    for row in &rows {
        writer.append(row)?;
    }
    Ok(Some(rows.len() as u64))
}

/// Runs a full ingestion: discover datasets under `root`, process each, and
/// finalize the table at `table_path`.
///
/// # Errors
/// Returns an error if the table cannot be created or written, or if `root`
/// cannot be traversed. Both are fatal to the run.
pub fn ingest(
    root: &Path,
    scheme: &NamingScheme,
    table_path: &Path,
    sink: &mut dyn DiagnosticSink,
) -> Result<IngestSummary> {
    let mut writer = HitTableWriter::create(table_path)?;
    let datasets = discover(root, scheme, sink)?;

    let mut summary = IngestSummary::default();
    for dataset in &datasets {
        match ingest_dataset(dataset, &mut writer, sink)? {
            Some(rows) => {
                summary.datasets += 1;
                summary.rows += rows;
            }
            None => summary.skipped_datasets += 1,
        }
    }

    writer.finish()?;
    Ok(summary)
}
