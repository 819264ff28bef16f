use thiserror::Error;

/// Failures surfaced by the content store. A missing entry is a normal,
/// recoverable condition and is kept apart from real I/O failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry not found")]
    NotFound,
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Reasons a signed request is rejected before it reaches the router.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing or stale request timestamp")]
    StaleTimestamp,
    #[error("missing request signature")]
    MissingSignature,
    #[error("request signature mismatch")]
    SignatureMismatch,
}
