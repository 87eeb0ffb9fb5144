use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine::{Email, EngineError, Label, Workflow, WorkflowExecution, WorkflowStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::services;
use crate::services::error::ServiceError;

/// Postgres-backed implementation of the engine's persistence
/// boundary.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn storage(err: ServiceError) -> EngineError {
    EngineError::Storage(err.to_string())
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn emails_for_user(&self, user_id: Uuid) -> Result<Vec<Email>, EngineError> {
        services::email::list_emails_for_user(&self.pool, user_id)
            .await
            .map_err(storage)
    }

    async fn email_for_user(
        &self,
        user_id: Uuid,
        email_id: Uuid,
    ) -> Result<Option<Email>, EngineError> {
        services::email::get_email_for_user(&self.pool, user_id, email_id)
            .await
            .map_err(storage)
    }

    async fn labels_for_user(&self, user_id: Uuid) -> Result<Vec<Label>, EngineError> {
        let rows = services::label::list_labels_for_user(&self.pool, user_id)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Label::from).collect())
    }

    async fn workflow_for_user(
        &self,
        user_id: Uuid,
        workflow_id: Uuid,
    ) -> Result<Option<Workflow>, EngineError> {
        services::workflow::get_workflow_for_user(&self.pool, user_id, workflow_id)
            .await
            .map_err(storage)
    }

    async fn record_execution(
        &self,
        workflow_id: Uuid,
        summary: &str,
        email_count: i64,
        executed_at: DateTime<Utc>,
    ) -> Result<WorkflowExecution, EngineError> {
        let row = services::workflow::record_execution(
            &self.pool,
            workflow_id,
            summary,
            email_count,
            executed_at,
        )
        .await
        .map_err(storage)?;
        Ok(row.into())
    }

    async fn assign_label(
        &self,
        email_id: Uuid,
        label_id: Uuid,
        is_auto: bool,
    ) -> Result<(), EngineError> {
        services::email::assign_label(&self.pool, email_id, label_id, is_auto)
            .await
            .map_err(storage)
    }
}
