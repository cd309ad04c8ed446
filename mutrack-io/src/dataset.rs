//! Dataset discovery and plane-file reading.
//!
//! A dataset is three plain-text files sharing a prefix and distinguished by
//! the per-plane readout suffix, e.g. `run7_06h00_mate-m101.txt` through
//! `-m103.txt`. Discovery walks a directory tree for plane-1 files and
//! requires all three siblings; a prefix missing one is skipped with a
//! diagnostic and never aborts the batch.

use crate::Result;
use mutrack_core::{Diagnostic, DiagnosticSink, PlaneId, RawRecord};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// File naming scheme linking the three planes of one dataset.
#[derive(Debug, Clone)]
pub struct NamingScheme {
    /// Tag between the dataset prefix and the plane suffix.
    pub tag: String,
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self {
            tag: "_06h00_mate-".to_owned(),
        }
    }
}

impl NamingScheme {
    /// Creates a scheme with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// File name suffix identifying the given plane.
    #[must_use]
    pub fn plane_suffix(&self, plane: PlaneId) -> String {
        format!("{}{}.txt", self.tag, plane.suffix())
    }

    /// Sibling path for `plane`, given any directory and dataset prefix.
    #[must_use]
    pub fn plane_path(&self, dir: &Path, prefix: &str, plane: PlaneId) -> PathBuf {
        dir.join(format!("{prefix}{}", self.plane_suffix(plane)))
    }
}

/// One discovered dataset: identifier plus the three plane files.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Dataset identifier: the shared file prefix.
    pub id: String,
    /// Plane file paths, bottom to top.
    pub files: [PathBuf; 3],
}

/// Recursively discovers complete datasets under `root`.
///
/// Prefixes with a missing sibling are reported and skipped. Results are
/// sorted by identifier so runs are deterministic regardless of directory
/// iteration order.
///
/// # Errors
/// Returns an error only if `root` itself cannot be traversed.
pub fn discover(
    root: &Path,
    scheme: &NamingScheme,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<Dataset>> {
    let mut datasets = Vec::new();
    let mut dirs = vec![root.to_path_buf()];
    let p1_suffix = scheme.plane_suffix(PlaneId::P1);

    while let Some(dir) = dirs.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(prefix) = name.strip_suffix(&p1_suffix) else {
                continue;
            };

            let files = [
                path.clone(),
                scheme.plane_path(&dir, prefix, PlaneId::P2),
                scheme.plane_path(&dir, prefix, PlaneId::P3),
            ];
            let missing: Vec<&PathBuf> = files.iter().filter(|f| !f.is_file()).collect();
            if missing.is_empty() {
                datasets.push(Dataset {
                    id: prefix.to_owned(),
                    files,
                });
            } else {
                sink.report(Diagnostic::warning(
                    prefix,
                    format!(
                        "skipping dataset, missing plane file(s): {}",
                        missing
                            .iter()
                            .map(|f| f.display().to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                ));
            }
        }
    }

    datasets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(datasets)
}

/// Reads and parses one plane file fully into memory.
///
/// Malformed lines are skipped with a warning diagnostic carrying the line
/// index; blank lines are ignored silently.
///
/// # Errors
/// Returns an error if the file cannot be opened or read; the caller treats
/// that as a skipped dataset, not a fatal condition.
pub fn read_plane(
    path: &Path,
    dataset: &str,
    plane: PlaneId,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<RawRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match RawRecord::parse(&line) {
            Ok(record) => records.push(record),
            Err(err) => {
                sink.report(
                    Diagnostic::warning(dataset, format!("skipping line {line:?}: {err}"))
                        .with_plane(plane)
                        .with_index(i),
                );
            }
        }
    }
    Ok(records)
}
