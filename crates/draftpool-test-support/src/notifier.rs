//! Test notifier — records every notice it is handed.

use std::sync::Mutex;

use draftpool_core::notice::{DraftChangeKind, DraftNotice, DraftNotifier};

/// A notifier that keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<DraftNotice>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all notices received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn notices(&self) -> Vec<DraftNotice> {
        self.notices.lock().unwrap().clone()
    }

    /// Returns the kinds of all notices received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn kinds(&self) -> Vec<DraftChangeKind> {
        self.notices.lock().unwrap().iter().map(|n| n.kind).collect()
    }
}

impl DraftNotifier for RecordingNotifier {
    fn draft_changed(&self, notice: DraftNotice) {
        self.notices.lock().unwrap().push(notice);
    }
}
