use std::sync::{Arc, RwLock};

use super::reader::SpreadsheetHandle;

/// Process-wide pointer to the displayed spreadsheet.
///
/// The lock only guards the pointer: readers clone the `Arc` and render from
/// that snapshot, so a swap in the middle of a render never shows them a
/// half-updated handle.
#[derive(Debug, Default)]
pub struct ActiveFileState {
    current: RwLock<Option<Arc<SpreadsheetHandle>>>,
}

impl ActiveFileState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the active handle, if any
    pub fn snapshot(&self) -> Option<Arc<SpreadsheetHandle>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the active handle, returning the previous one
    pub fn replace(&self, handle: Arc<SpreadsheetHandle>) -> Option<Arc<SpreadsheetHandle>> {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.replace(handle)
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }
}
