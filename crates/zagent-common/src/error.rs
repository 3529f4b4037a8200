/// Errors a source reader can report instead of metrics.
///
/// The aggregator never propagates these: a failed source contributes no
/// metrics to the snapshot, and the error is kept in the per-source report so
/// callers can tell an empty source from a broken one.
///
/// # Examples
///
/// ```rust
/// use zagent_common::error::SourceError;
///
/// let err = SourceError::format("quota", "expected 7 fields, found 3");
/// assert!(err.to_string().contains("quota"));
/// assert!(!err.is_unavailable());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The command could not be spawned, or the system file could not be read.
    #[error("Source {source_name}: unavailable: {detail}")]
    Unavailable {
        source_name: &'static str,
        detail: String,
    },

    /// The source produced output that does not match its expected layout.
    #[error("Source {source_name}: unexpected format: {detail}")]
    Format {
        source_name: &'static str,
        detail: String,
    },

    /// The source produced a JSON document that failed to decode.
    #[error("Source {source_name}: invalid JSON: {error}")]
    Json {
        source_name: &'static str,
        #[source]
        error: serde_json::Error,
    },
}

impl SourceError {
    pub fn unavailable(source_name: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            source_name,
            detail: detail.to_string(),
        }
    }

    pub fn format(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::Format {
            source_name,
            detail: detail.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Convenience `Result` alias for source readers.
pub type Result<T> = std::result::Result<T, SourceError>;
