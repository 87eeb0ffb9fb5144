use crate::core::{ApiError, AppState, UserId};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use db::services::{email, label};
use engine::{classify_email, filter_emails, Email, Label, WorkflowFilter};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ListEmailsParams {
    pub label_id: Option<Uuid>,
}

/// Lists the user's emails newest-first, optionally narrowed to one
/// label.
pub async fn list_emails_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Query(params): Query<ListEmailsParams>,
) -> Result<Json<Vec<Email>>, ApiError> {
    let emails = email::list_emails_for_user(app_state.store.pool(), user_id).await?;

    let emails = match params.label_id {
        Some(label_id) => filter_emails(
            &WorkflowFilter {
                label_ids: vec![label_id],
            },
            emails,
        ),
        None => emails,
    };

    Ok(Json(emails))
}

pub async fn get_email_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(email_id): Path<Uuid>,
) -> Result<Json<Email>, ApiError> {
    let found = email::get_email_for_user(app_state.store.pool(), user_id, email_id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(found))
}

pub async fn mark_read_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(email_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let updated = email::mark_email_read(app_state.store.pool(), user_id, email_id).await?;
    if !updated {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Manually attaches a label to an email. Both sides of the
/// association are ownership-checked before the write; repeating an
/// assignment is a no-op.
pub async fn assign_label_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path((email_id, label_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let pool = app_state.store.pool();
    email::get_email_for_user(pool, user_id, email_id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    label::get_label_for_user(pool, user_id, label_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    email::assign_label(pool, email_id, label_id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_label_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path((email_id, label_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let pool = app_state.store.pool();
    email::get_email_for_user(pool, user_id, email_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let removed = email::remove_label(pool, email_id, label_id).await?;
    if !removed {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Runs AI-assisted classification for one email and responds with the
/// labels that were applied (possibly none).
#[axum::debug_handler]
pub async fn classify_email_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(email_id): Path<Uuid>,
) -> Result<Json<Vec<Label>>, ApiError> {
    let applied = classify_email(&app_state.store, &*app_state.llm, user_id, email_id).await?;
    Ok(Json(applied))
}
