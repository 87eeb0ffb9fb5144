use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::{Email, Label, Workflow, WorkflowExecution};

/// Persistence boundary for the engine. Every lookup is scoped by the
/// owning user; a row owned by someone else is reported as absent,
/// never returned.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// All of a user's emails with their label associations, ordered
    /// newest-first.
    async fn emails_for_user(&self, user_id: Uuid) -> Result<Vec<Email>, EngineError>;

    async fn email_for_user(
        &self,
        user_id: Uuid,
        email_id: Uuid,
    ) -> Result<Option<Email>, EngineError>;

    async fn labels_for_user(&self, user_id: Uuid) -> Result<Vec<Label>, EngineError>;

    async fn workflow_for_user(
        &self,
        user_id: Uuid,
        workflow_id: Uuid,
    ) -> Result<Option<Workflow>, EngineError>;

    /// Persists one execution record and advances the workflow's
    /// last-run marker to `executed_at`. Implementations commit both
    /// writes together or not at all.
    async fn record_execution(
        &self,
        workflow_id: Uuid,
        summary: &str,
        email_count: i64,
        executed_at: DateTime<Utc>,
    ) -> Result<WorkflowExecution, EngineError>;

    /// Associates a label with an email. Assigning an already-present
    /// (email, label) pair is a no-op, not an error.
    async fn assign_label(
        &self,
        email_id: Uuid,
        label_id: Uuid,
        is_auto: bool,
    ) -> Result<(), EngineError>;
}
