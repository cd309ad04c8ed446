//! mutrack-io: Dataset discovery, the persistent hit table, and track output.
//!
//! Readout files come in as plain text, three per dataset; assembled rows go
//! out into an append-only fixed-width binary table that is memory-mapped
//! for ordinal access. Reconstructed tracks and accepted-event polylines are
//! written as CSV for downstream plotting.

mod error;

pub mod dataset;
pub mod pipeline;
pub mod table;
pub mod tracks;

pub use dataset::{discover, read_plane, Dataset, NamingScheme};
pub use error::{Error, Result};
pub use pipeline::{ingest, ingest_dataset, IngestSummary};
pub use table::{HitTable, HitTableWriter, COLUMNS};
pub use tracks::TrackWriter;
