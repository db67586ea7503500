//! # Print Service
//!
//! Hand-off point between a rendered quotation and the platform.
//!
//! ```text
//! RenderedDocument ──► print_to_file() ──► <documents_dir>/cotizacion_<id>_<ms>.html
//!                                                   │
//!                                                   ▼
//!                                               share(path) ──► true / false
//! ```
//!
//! No retries: a failed hand-off is reported once and the caller decides.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use colva_core::document::RenderedDocument;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("Could not create documents folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not write document {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Turns a rendered document into a file and shares it.
pub trait PrintService: Send + Sync {
    /// Writes the payload and returns where it landed.
    fn print_to_file(&self, document: &RenderedDocument) -> Result<PathBuf, PrintError>;

    /// Offers the file to the user. `false` when it could not be handed off.
    fn share(&self, path: &Path) -> bool;
}

/// Writes documents into a local folder.
#[derive(Debug, Clone)]
pub struct LocalPrintService {
    documents_dir: PathBuf,
}

impl LocalPrintService {
    pub fn new(documents_dir: impl Into<PathBuf>) -> Self {
        LocalPrintService {
            documents_dir: documents_dir.into(),
        }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }
}

impl PrintService for LocalPrintService {
    fn print_to_file(&self, document: &RenderedDocument) -> Result<PathBuf, PrintError> {
        fs::create_dir_all(&self.documents_dir).map_err(|source| PrintError::CreateDir {
            path: self.documents_dir.clone(),
            source,
        })?;

        let path = self.documents_dir.join(&document.file_name);
        fs::write(&path, document.body.as_bytes()).map_err(|source| PrintError::Write {
            path: path.clone(),
            source,
        })?;

        info!(
            quotation_id = document.quotation_id,
            path = %path.display(),
            bytes = document.body.len(),
            "Document written"
        );
        Ok(path)
    }

    fn share(&self, path: &Path) -> bool {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                info!(path = %path.display(), "Document ready to share");
                true
            }
            Ok(_) => {
                warn!(path = %path.display(), "Share target is not a file");
                false
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Document cannot be shared");
                false
            }
        }
    }
}
