use thiserror::Error;

/// Errors surfaced at the load and export boundaries.
///
/// Everything inside the pipeline recovers locally (bad numeric cells become
/// 0, unmatched descriptions land in the fallback category, an empty working
/// set is a valid state), so the only fallible operations are reading the
/// source table and writing report files.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AuditError>;
