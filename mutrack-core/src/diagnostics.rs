//! Structured diagnostics for batch processing.
//!
//! Every recoverable anomaly (malformed line, event-number gap, cross-plane
//! misalignment, truncated assembly) is reported as a [`Diagnostic`] value
//! through a [`DiagnosticSink`], never as control flow. Consumers decide what
//! to do with them: the CLI forwards to the `log` crate, tests collect them.

use crate::record::PlaneId;
use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational, e.g. cross-plane misalignment.
    Info,
    /// Recoverable anomaly, e.g. a skipped record.
    Warning,
    /// Fatal for the current dataset, e.g. an unreadable plane file.
    Error,
}

/// One structured diagnostic with enough context to locate the source record.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity of the condition.
    pub severity: Severity,
    /// Dataset identifier (the shared file prefix).
    pub dataset: String,
    /// Plane the condition was observed on, if plane-specific.
    pub plane: Option<PlaneId>,
    /// Zero-based line or row index, if record-specific.
    pub index: Option<usize>,
    /// Human-readable description including offending values.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic with the given severity.
    pub fn new(severity: Severity, dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            dataset: dataset.into(),
            plane: None,
            index: None,
            message: message.into(),
        }
    }

    /// Creates an informational diagnostic.
    pub fn info(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, dataset, message)
    }

    /// Creates a warning diagnostic.
    pub fn warning(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, dataset, message)
    }

    /// Creates an error diagnostic.
    pub fn error(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, dataset, message)
    }

    /// Attaches the plane the condition was observed on.
    #[must_use]
    pub fn with_plane(mut self, plane: PlaneId) -> Self {
        self.plane = Some(plane);
        self
    }

    /// Attaches the zero-based line or row index.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.dataset)?;
        if let Some(plane) = self.plane {
            write!(f, " {plane}")?;
        }
        if let Some(index) = self.index {
            write!(f, " line {index}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Sink for structured diagnostics.
pub trait DiagnosticSink {
    /// Delivers one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Sink that collects diagnostics into a vector. Used in tests and by callers
/// that want to inspect the anomaly list after a run.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Collected diagnostics in report order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many diagnostics of the given severity were collected.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let d = Diagnostic::warning("run_042", "event gap 6 -> 8")
            .with_plane(PlaneId::P2)
            .with_index(17);
        let text = d.to_string();
        assert!(text.contains("run_042"));
        assert!(text.contains("m102"));
        assert!(text.contains("line 17"));
        assert!(text.contains("6 -> 8"));
    }

    #[test]
    fn test_collecting_sink_counts() {
        let mut sink = CollectingSink::new();
        sink.report(Diagnostic::info("d", "a"));
        sink.report(Diagnostic::warning("d", "b"));
        sink.report(Diagnostic::warning("d", "c"));
        assert_eq!(sink.count(Severity::Info), 1);
        assert_eq!(sink.count(Severity::Warning), 2);
        assert_eq!(sink.count(Severity::Error), 0);
    }
}
