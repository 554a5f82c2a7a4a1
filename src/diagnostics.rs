//! Recoverable-error channel.
//!
//! The pipeline never stops on a bad template, bad JSON or a failed
//! remote render; those events land here as diagnostics the host UI can
//! observe, and are mirrored to the `log` facade. Fatal conditions use
//! [`crate::Error`] instead.

use std::sync::{Arc, Mutex};

/// Which stage of the pipeline produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSource {
    /// Template compilation fell back to the raw HTML
    TemplateCompile,
    /// The params buffer did not parse as JSON
    ParamParse,
    /// The remote render produced no usable image
    RemoteRender,
    /// Durable storage could not be read or written
    Storage,
}

impl DiagnosticSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticSource::TemplateCompile => "template-compile",
            DiagnosticSource::ParamParse => "param-parse",
            DiagnosticSource::RemoteRender => "remote-render",
            DiagnosticSource::Storage => "storage",
        }
    }
}

/// A single recoverable event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub source: DiagnosticSource,
    pub message: String,
}

/// Shared, append-only log of recoverable events.
///
/// Handles are cheap to clone; every pipeline stage holds one and pushes
/// into the same backing store.
#[derive(Clone, Default)]
pub struct Diagnostics {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recoverable event and emit it as a `log` warning.
    pub fn record(&self, source: DiagnosticSource, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}: {}", source.as_str(), message);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Diagnostic { source, message });
        }
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// The most recent event, if any.
    pub fn last(&self) -> Option<Diagnostic> {
        self.entries.lock().ok().and_then(|e| e.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of events from one source; used by tests to assert that a
    /// stage recovered rather than silently succeeded.
    pub fn count_from(&self, source: DiagnosticSource) -> usize {
        self.entries
            .lock()
            .map(|e| e.iter().filter(|d| d.source == source).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_read_back() {
        let diags = Diagnostics::new();
        assert!(diags.is_empty());

        diags.record(DiagnosticSource::ParamParse, "bad json");
        diags.record(DiagnosticSource::RemoteRender, "timed out");

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.last().unwrap().source, DiagnosticSource::RemoteRender);
        assert_eq!(diags.count_from(DiagnosticSource::ParamParse), 1);
        assert_eq!(diags.entries()[0].message, "bad json");
    }

    #[test]
    fn clones_share_the_log() {
        let diags = Diagnostics::new();
        let other = diags.clone();
        other.record(DiagnosticSource::Storage, "disk full");
        assert_eq!(diags.len(), 1);
    }
}
