use thiserror::Error;

/// Failure conditions for workflow execution and classification.
/// None of these are retried automatically; every failure is
/// single-attempt and surfaced to the caller that invoked the
/// operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced workflow/email/label does not exist or is not
    /// owned by the caller.
    #[error("Not found")]
    NotFound,

    /// The workflow filter matched zero emails; the run is rejected
    /// before any model call and nothing is persisted.
    #[error("No emails matched the workflow filter")]
    EmptySelection,

    /// Classification was attempted with zero labels defined.
    #[error("No labels are defined; create labels before classifying")]
    NotConfigured,

    /// The language-model call failed or returned unusable output.
    #[error("Language model call failed: {0}")]
    Upstream(String),

    /// The persistence layer rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(String),
}
