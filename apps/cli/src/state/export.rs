//! # Export State
//!
//! Path of the last generated document, for "open last document".

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct ExportState {
    last: Arc<Mutex<Option<PathBuf>>>,
}

impl ExportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a path remembered by a previous run.
    pub fn with_last(path: Option<PathBuf>) -> Self {
        ExportState {
            last: Arc::new(Mutex::new(path)),
        }
    }

    pub fn record(&self, path: &Path) {
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        *last = Some(path.to_path_buf());
    }

    pub fn last(&self) -> Option<PathBuf> {
        self.last.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn clear(&self) {
        *self.last.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}
