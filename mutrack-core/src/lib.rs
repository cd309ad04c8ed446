//! mutrack-core: Types and algorithms for muon telescope track reconstruction.
//!
//! This crate covers the in-memory half of the pipeline: raw record parsing,
//! cross-plane event synchronization, strip-word decoding, triplet assembly,
//! closed-form trajectory fitting, and geometric quality cuts. File I/O and
//! the persistent hit table live in `mutrack-io`.

pub mod assemble;
pub mod decode;
pub mod diagnostics;
pub mod error;
pub mod fit;
pub mod geometry;
pub mod incidence;
pub mod quality;
pub mod record;
pub mod sync;

pub use assemble::{assemble, build_rows, decode_plane, AssembledRow};
pub use decode::{decode_record, decode_word, DecodedHit, INVALID_STRIP, STRIPS_PER_AXIS};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, Severity};
pub use error::{Error, Result};
pub use fit::{FitterConfig, LineFit, TrackFit, TrajectoryFitter};
pub use geometry::Geometry;
pub use incidence::{incidence_scan, IncidenceMatch, IncidenceSummary, RowRange, TargetCoordinate};
pub use quality::{Polyline, QualityConfig, QualityFilter, Verdict};
pub use record::{PlaneId, RawRecord};
pub use sync::{check_alignment, scan_gaps, synchronize, ExclusionInterval, SyncReport};
