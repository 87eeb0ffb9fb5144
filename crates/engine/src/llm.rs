use async_trait::async_trait;

use crate::error::EngineError;
use crate::model::EmailBrief;

/// Turns a set of emails plus a free-text instruction into prose.
/// No schema is imposed on the returned text beyond "non-empty".
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, emails: &[EmailBrief], prompt: &str)
        -> Result<String, EngineError>;
}

/// Suggests which of the candidate label names apply to one email.
/// Implementations must tolerate zero candidates by returning no
/// labels without invoking the external model; names outside the
/// candidate set are dropped by the caller.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        subject: &str,
        body: &str,
        candidates: &[String],
    ) -> Result<Vec<String>, EngineError>;
}
