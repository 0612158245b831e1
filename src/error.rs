use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for a migration run.
///
/// Only [`MigrateError::Configuration`] is allowed to end a run; the per-file
/// variants are converted into outcome values at each component boundary.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("scan directory not found: {}", .0.display())]
    ScanDirectoryMissing(PathBuf),

    #[error("upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },

    #[error("catalog query for '{token}' failed: {message}")]
    MatchQuery { token: String, message: String },

    #[error("catalog update for product {product_id} failed: {message}")]
    Persist { product_id: String, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;

/// Clip remote error bodies before they land in console output.
pub(crate) fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}
