//! Storage error types.

/// Errors from the local blob store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing a blob failed
    #[error("storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Blob could not be encoded or decoded
    #[error("storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}
