//! Error types for litvault-core

/// Result type for litvault-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in litvault-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or incomplete engine configuration.
    ///
    /// Fatal: raised before any vault mutation.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Generation failed for a single record.
    ///
    /// Scoped to that record; never aborts the batch.
    #[error("Generation failed for {key}: {source}")]
    Generate {
        key: String,
        #[source]
        source: crate::generate::GenerateError,
    },

    /// The final status persist failed.
    ///
    /// Surfaced as a pass-level warning; the next pass recomputes the same
    /// plan from the old status.
    #[error("Failed to persist status for {library}: {source}")]
    StatusWrite {
        library: String,
        #[source]
        source: litvault_fs::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from litvault-fs
    #[error(transparent)]
    Fs(#[from] litvault_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}
