use thiserror::Error;

use crate::documents::DocumentError;

/// Maximum number of characters of an error message written to the logs.
pub const LOG_MESSAGE_LIMIT: usize = 50;

/// Application-level error type.
///
/// Only `Worklist` and `Output` are fatal to a batch run. Everything else is
/// caught per item and turned into an "Error" row by the pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Worklist error: {0}")]
    Worklist(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Shortens an error message for diagnostics. Cuts on a char boundary.
pub fn truncate_for_log(message: &str) -> &str {
    match message.char_indices().nth(LOG_MESSAGE_LIMIT) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}
