use chrono::{DateTime, Utc};
use engine::{Frequency, Workflow, WorkflowFilter};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::workflow::{ExecutionRow, WorkflowRow};
use crate::services::error::ServiceError;

/// Listings expose at most this many recent executions per workflow.
pub const EXECUTION_HISTORY_LIMIT: i64 = 10;

/// Decodes the stored frequency and jsonb filter into domain types.
pub fn workflow_from_row(row: WorkflowRow) -> Result<Workflow, ServiceError> {
    let frequency: Frequency = row.frequency.parse()?;
    let filter: WorkflowFilter = serde_json::from_value(row.filter)?;
    Ok(Workflow {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        description: row.description,
        frequency,
        filter,
        prompt: row.prompt,
        active: row.active,
        last_run_at: row.last_run_at,
        next_run_at: row.next_run_at,
    })
}

#[allow(clippy::too_many_arguments)]
pub async fn create_workflow(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
    frequency: Frequency,
    filter: &WorkflowFilter,
    prompt: &str,
    next_run_at: DateTime<Utc>,
) -> Result<Workflow, ServiceError> {
    let filter_json = serde_json::to_value(filter)?;
    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"
        INSERT INTO workflows
            (id, user_id, name, description, frequency, filter, prompt, active, last_run_at, next_run_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, NULL, $8)
        RETURNING id, user_id, name, description, frequency, filter, prompt, active, last_run_at, next_run_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(frequency.as_str())
    .bind(filter_json)
    .bind(prompt)
    .bind(next_run_at)
    .fetch_one(pool)
    .await?;
    workflow_from_row(row)
}

pub async fn list_workflows_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Workflow>, ServiceError> {
    let rows = sqlx::query_as::<_, WorkflowRow>(
        r#"
        SELECT id, user_id, name, description, frequency, filter, prompt, active, last_run_at, next_run_at
        FROM workflows
        WHERE user_id = $1
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(workflow_from_row).collect()
}

pub async fn get_workflow_for_user(
    pool: &PgPool,
    user_id: Uuid,
    workflow_id: Uuid,
) -> Result<Option<Workflow>, ServiceError> {
    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"
        SELECT id, user_id, name, description, frequency, filter, prompt, active, last_run_at, next_run_at
        FROM workflows
        WHERE user_id = $1 AND id = $2
        "#,
    )
    .bind(user_id)
    .bind(workflow_id)
    .fetch_optional(pool)
    .await?;
    row.map(workflow_from_row).transpose()
}

/// Writes back the full editable field set of a workflow. Returns
/// `None` when the workflow does not exist or belongs to someone else.
#[allow(clippy::too_many_arguments)]
pub async fn update_workflow(
    pool: &PgPool,
    user_id: Uuid,
    workflow_id: Uuid,
    name: &str,
    description: Option<&str>,
    frequency: Frequency,
    filter: &WorkflowFilter,
    prompt: &str,
    active: bool,
    next_run_at: DateTime<Utc>,
) -> Result<Option<Workflow>, ServiceError> {
    let filter_json = serde_json::to_value(filter)?;
    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"
        UPDATE workflows
        SET name = $3, description = $4, frequency = $5, filter = $6,
            prompt = $7, active = $8, next_run_at = $9
        WHERE user_id = $1 AND id = $2
        RETURNING id, user_id, name, description, frequency, filter, prompt, active, last_run_at, next_run_at
        "#,
    )
    .bind(user_id)
    .bind(workflow_id)
    .bind(name)
    .bind(description)
    .bind(frequency.as_str())
    .bind(filter_json)
    .bind(prompt)
    .bind(active)
    .bind(next_run_at)
    .fetch_optional(pool)
    .await?;
    row.map(workflow_from_row).transpose()
}

/// Deletes a workflow; its executions cascade. Returns whether a row
/// was deleted.
pub async fn delete_workflow(
    pool: &PgPool,
    user_id: Uuid,
    workflow_id: Uuid,
) -> Result<bool, ServiceError> {
    let result = sqlx::query(
        r#"
        DELETE FROM workflows
        WHERE user_id = $1 AND id = $2
        "#,
    )
    .bind(user_id)
    .bind(workflow_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Inserts one execution record and advances the workflow's last-run
/// marker, committing both writes together or not at all.
pub async fn record_execution(
    pool: &PgPool,
    workflow_id: Uuid,
    summary: &str,
    email_count: i64,
    executed_at: DateTime<Utc>,
) -> Result<ExecutionRow, ServiceError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ExecutionRow>(
        r#"
        INSERT INTO workflow_executions (id, workflow_id, summary, email_count, executed_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, workflow_id, summary, email_count, executed_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(workflow_id)
    .bind(summary)
    .bind(email_count)
    .bind(executed_at)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE workflows
        SET last_run_at = $2
        WHERE id = $1
        "#,
    )
    .bind(workflow_id)
    .bind(executed_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    debug!(%workflow_id, email_count, "execution recorded and last-run advanced");
    Ok(row)
}

/// The most recent executions for a workflow, newest-first, capped at
/// `EXECUTION_HISTORY_LIMIT`. Ownership is enforced via the workflow
/// join; callers distinguish "unowned workflow" from "no history" by
/// loading the workflow first.
pub async fn list_recent_executions(
    pool: &PgPool,
    user_id: Uuid,
    workflow_id: Uuid,
) -> Result<Vec<ExecutionRow>, ServiceError> {
    let rows = sqlx::query_as::<_, ExecutionRow>(
        r#"
        SELECT x.id, x.workflow_id, x.summary, x.email_count, x.executed_at
        FROM workflow_executions x
        JOIN workflows w ON x.workflow_id = w.id
        WHERE w.user_id = $1 AND w.id = $2
        ORDER BY x.executed_at DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(workflow_id)
    .bind(EXECUTION_HISTORY_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
