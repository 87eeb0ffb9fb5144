use chrono::{DateTime, Utc};
use engine::WorkflowExecution;
use sqlx::FromRow;
use uuid::Uuid;

/// Raw workflow row. `frequency` and `filter` are decoded into their
/// domain types by `services::workflow::workflow_from_row`.
#[derive(Debug, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub frequency: String,
    pub filter: serde_json::Value,
    pub prompt: String,
    pub active: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct ExecutionRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub summary: String,
    pub email_count: i64,
    pub executed_at: DateTime<Utc>,
}

impl From<ExecutionRow> for WorkflowExecution {
    fn from(row: ExecutionRow) -> Self {
        WorkflowExecution {
            id: row.id,
            workflow_id: row.workflow_id,
            summary: row.summary,
            email_count: row.email_count,
            executed_at: row.executed_at,
        }
    }
}
