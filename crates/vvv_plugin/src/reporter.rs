//! Output collector shared by all plugins.
//!
//! The reporter is the only shared mutable state of a run. Append calls take
//! `&self` and serialise through a mutex, so the reporter can be handed to
//! plugins by reference even if dispatch is ever spread over threads.
//!
//! When `abort_on_first_error` is set, every append-style call returns
//! [`Aborted`] after the entry has been recorded. That value is the run's only
//! cooperative cancellation mechanism: plugins propagate it with `?` and the
//! orchestrator stops scheduling files and plugins once it sees it.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::{Aborted, Finding};

/// One recorded reporter entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    /// Structured validation finding.
    Finding(Finding),
    /// Raw validator output, kept verbatim.
    Unstructured {
        plugin_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        text: String,
    },
    /// Failure of the plugin itself rather than of the validated file.
    InternalError { plugin_id: String, trace: String },
}

impl Entry {
    /// Returns the id of the plugin that produced this entry.
    pub fn plugin_id(&self) -> &str {
        match self {
            Entry::Finding(finding) => &finding.plugin_id,
            Entry::Unstructured { plugin_id, .. } | Entry::InternalError { plugin_id, .. } => {
                plugin_id
            }
        }
    }

    /// Returns the file this entry refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Entry::Finding(finding) => Some(&finding.path),
            Entry::Unstructured { path, .. } => path.as_deref(),
            Entry::InternalError { .. } => None,
        }
    }

    /// Renders the entry as plain text.
    pub fn render(&self) -> String {
        match self {
            Entry::Finding(finding) => finding.render(),
            Entry::Unstructured { text, .. } => text.trim_end().to_string(),
            Entry::InternalError { plugin_id, trace } => format!(
                "Internal error occurred when running validator {}\n{}",
                plugin_id,
                trace.trim_end()
            ),
        }
    }
}

/// Collects findings, raw output, internal errors and hints for one run.
#[derive(Debug, Default)]
pub struct Reporter {
    abort_on_first_error: bool,
    aborted: AtomicBool,
    entries: Mutex<Vec<Entry>>,
    hints: Mutex<Vec<String>>,
}

impl Reporter {
    /// Creates a new reporter.
    pub fn new(abort_on_first_error: bool) -> Self {
        Self {
            abort_on_first_error,
            ..Self::default()
        }
    }

    /// Returns whether the reporter cancels the run on the first entry.
    pub fn abort_on_first_error(&self) -> bool {
        self.abort_on_first_error
    }

    /// Appends a structured finding.
    pub fn report_detailed(&self, finding: Finding) -> Result<(), Aborted> {
        debug!(
            "{}: {} {}",
            finding.plugin_id, finding.path, finding.message
        );
        self.push(Entry::Finding(finding))
    }

    /// Appends raw validator output verbatim.
    pub fn report_unstructured(
        &self,
        plugin_id: impl Into<String>,
        text: impl Into<String>,
        path: Option<&str>,
    ) -> Result<(), Aborted> {
        self.push(Entry::Unstructured {
            plugin_id: plugin_id.into(),
            path: path.map(str::to_string),
            text: text.into(),
        })
    }

    /// Appends a diagnostic about a plugin failure.
    pub fn report_internal_error(
        &self,
        plugin_id: impl Into<String>,
        trace: impl Into<String>,
    ) -> Result<(), Aborted> {
        self.push(Entry::InternalError {
            plugin_id: plugin_id.into(),
            trace: trace.into(),
        })
    }

    /// Adds a remediation hint. Hints are deduplicated and never cancel the run.
    pub fn hint_user(&self, message: impl Into<String>) {
        let message = message.into();
        let mut hints = self.hints.lock();
        if !hints.contains(&message) {
            hints.push(message);
        }
    }

    fn push(&self, entry: Entry) -> Result<(), Aborted> {
        self.entries.lock().push(entry);

        if self.abort_on_first_error {
            self.aborted.store(true, Ordering::SeqCst);
            return Err(Aborted);
        }
        Ok(())
    }

    /// Returns true once a fail-fast cancellation has been signalled.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of the recorded entries in insertion order.
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    /// Returns the unique hints in insertion order.
    pub fn hints(&self) -> Vec<String> {
        self.hints.lock().clone()
    }

    /// Returns true if nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty() && self.hints.lock().is_empty()
    }

    /// Number of structured findings.
    pub fn finding_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| matches!(e, Entry::Finding(_)))
            .count()
    }

    /// Number of internal errors.
    pub fn internal_error_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| matches!(e, Entry::InternalError { .. }))
            .count()
    }

    /// Renders all entries followed by all unique hints.
    ///
    /// An empty string means no violations.
    pub fn get_output(&self) -> String {
        let entries = self.entries.lock();
        let hints = self.hints.lock();

        entries
            .iter()
            .map(Entry::render)
            .chain(hints.iter().cloned())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
