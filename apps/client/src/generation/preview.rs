//! Where a generated document goes once it arrives. Hosts with an inline
//! viewer hold the bytes until an explicit close; the CLI uses the
//! forced-download fallback and writes the file straight to disk.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub bytes: Bytes,
}

pub trait PreviewSurface: Send + Sync {
    fn present(&self, document: &GeneratedDocument) -> Result<(), AppError>;
}

/// Forced-download fallback: writes the document into the output directory
/// under its computed filename.
pub struct DownloadSink {
    out_dir: PathBuf,
}

impl DownloadSink {
    pub fn new(out_dir: &Path) -> Self {
        DownloadSink {
            out_dir: out_dir.to_path_buf(),
        }
    }
}

impl PreviewSurface for DownloadSink {
    fn present(&self, document: &GeneratedDocument) -> Result<(), AppError> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(&document.file_name);
        fs::write(&path, &document.bytes)?;
        info!("Saved document to {}", path.display());
        Ok(())
    }
}
