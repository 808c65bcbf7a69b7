//! Résumé document reading. A locator is a filesystem path; `.txt` files are
//! read as-is and everything else is decoded as PDF.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF decode failed: {0}")]
    Pdf(String),

    #[error("Document task failed: {0}")]
    Task(String),
}

/// Locator → plain text. An unreadable document is an error for that item only.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read_text(&self, locator: &str) -> Result<String, DocumentError>;
}

pub struct FileDocumentReader;

#[async_trait]
impl DocumentReader for FileDocumentReader {
    async fn read_text(&self, locator: &str) -> Result<String, DocumentError> {
        let path = Path::new(locator);

        let text = if is_plain_text(path) {
            tokio::fs::read_to_string(path).await?
        } else {
            let owned = path.to_path_buf();
            // PDF decoding is CPU-bound and synchronous.
            tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&owned).map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| DocumentError::Task(e.to_string()))?
            .map_err(DocumentError::Pdf)?
        };

        debug!("Read {} characters from {}", text.chars().count(), locator);
        Ok(text)
    }
}

fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}
