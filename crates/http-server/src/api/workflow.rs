use crate::core::{ApiError, AppState, UserId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use db::services::workflow;
use engine::{
    execute_workflow, Clock, Frequency, Workflow, WorkflowExecution, WorkflowFilter,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 128;

#[derive(Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    #[serde(default)]
    pub filter: WorkflowFilter,
    pub prompt: String,
}

/// Partial update; omitted fields keep their stored values. The
/// description is doubly optional so an explicit `null` clears it
/// while leaving it out keeps it.
#[derive(Deserialize, Default)]
pub struct UpdateWorkflowRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub frequency: Option<Frequency>,
    pub filter: Option<WorkflowFilter>,
    pub prompt: Option<String>,
    pub active: Option<bool>,
}

/// Keeps the outer `Some` when the field is present, even as `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

pub async fn list_workflows_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<Workflow>>, ApiError> {
    let workflows = workflow::list_workflows_for_user(app_state.store.pool(), user_id).await?;
    Ok(Json(workflows))
}

#[axum::debug_handler]
pub async fn create_workflow_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Json(payload): Json<CreateWorkflowRequest>,
) -> Result<(StatusCode, Json<Workflow>), ApiError> {
    validate_name_and_prompt(&payload.name, &payload.prompt)?;

    // Next run is nominal only: nothing in this service fires it.
    let next_run_at = payload.frequency.next_run_after(app_state.clock.now());
    let created = workflow::create_workflow(
        app_state.store.pool(),
        user_id,
        payload.name.trim(),
        payload.description.as_deref(),
        payload.frequency,
        &payload.filter,
        payload.prompt.trim(),
        next_run_at,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_workflow_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<Workflow>, ApiError> {
    let found = workflow::get_workflow_for_user(app_state.store.pool(), user_id, workflow_id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(found))
}

pub async fn update_workflow_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(workflow_id): Path<Uuid>,
    Json(payload): Json<UpdateWorkflowRequest>,
) -> Result<Json<Workflow>, ApiError> {
    let existing = workflow::get_workflow_for_user(app_state.store.pool(), user_id, workflow_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let name = payload.name.unwrap_or(existing.name);
    let description = match payload.description {
        Some(new_value) => new_value,
        None => existing.description,
    };
    let frequency = payload.frequency.unwrap_or(existing.frequency);
    let filter = payload.filter.unwrap_or(existing.filter);
    let prompt = payload.prompt.unwrap_or(existing.prompt);
    let active = payload.active.unwrap_or(existing.active);
    validate_name_and_prompt(&name, &prompt)?;

    // A cadence change restarts the nominal schedule from now.
    let next_run_at = if frequency == existing.frequency {
        existing.next_run_at
    } else {
        frequency.next_run_after(app_state.clock.now())
    };

    let updated = workflow::update_workflow(
        app_state.store.pool(),
        user_id,
        workflow_id,
        name.trim(),
        description.as_deref(),
        frequency,
        &filter,
        prompt.trim(),
        active,
        next_run_at,
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(updated))
}

pub async fn delete_workflow_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(workflow_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = workflow::delete_workflow(app_state.store.pool(), user_id, workflow_id).await?;
    if !deleted {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Triggers one run of the workflow and responds with the recorded
/// execution.
#[axum::debug_handler]
pub async fn execute_workflow_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(workflow_id): Path<Uuid>,
) -> Result<(StatusCode, Json<WorkflowExecution>), ApiError> {
    let execution = execute_workflow(
        &app_state.store,
        &*app_state.llm,
        &app_state.clock,
        &app_state.locks,
        user_id,
        workflow_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(execution)))
}

pub async fn list_executions_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<Vec<WorkflowExecution>>, ApiError> {
    let pool = app_state.store.pool();
    // Distinguish an unowned workflow from one with no history yet.
    workflow::get_workflow_for_user(pool, user_id, workflow_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let rows = workflow::list_recent_executions(pool, user_id, workflow_id).await?;
    Ok(Json(rows.into_iter().map(WorkflowExecution::from).collect()))
}

fn validate_name_and_prompt(name: &str, prompt: &str) -> Result<(), ApiError> {
    let name = name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "Workflow name must be between 1 and {} characters.",
            MAX_NAME_LEN
        )));
    }
    if prompt.trim().is_empty() {
        return Err(ApiError::Validation(
            "Workflow prompt must not be empty.".to_string(),
        ));
    }
    Ok(())
}
