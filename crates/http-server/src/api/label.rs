use crate::core::{ApiError, AppState, UserId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use db::services::label;
use engine::Label;
use serde::Deserialize;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 64;
const MAX_COLOR_LEN: usize = 32;

#[derive(Deserialize)]
pub struct LabelPayload {
    pub name: String,
    pub color: String,
    pub description: Option<String>,
}

pub async fn list_labels_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<Label>>, ApiError> {
    let rows = label::list_labels_for_user(app_state.store.pool(), user_id).await?;
    Ok(Json(rows.into_iter().map(Label::from).collect()))
}

#[axum::debug_handler]
pub async fn create_label_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Json(payload): Json<LabelPayload>,
) -> Result<(StatusCode, Json<Label>), ApiError> {
    validate_label(&payload)?;

    let row = label::create_label(
        app_state.store.pool(),
        user_id,
        payload.name.trim(),
        payload.color.trim(),
        payload.description.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(Label::from(row))))
}

pub async fn update_label_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(label_id): Path<Uuid>,
    Json(payload): Json<LabelPayload>,
) -> Result<Json<Label>, ApiError> {
    validate_label(&payload)?;

    let row = label::update_label(
        app_state.store.pool(),
        user_id,
        label_id,
        payload.name.trim(),
        payload.color.trim(),
        payload.description.as_deref(),
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(Label::from(row)))
}

pub async fn delete_label_handler(
    State(app_state): State<AppState>,
    UserId(user_id): UserId,
    Path(label_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = label::delete_label(app_state.store.pool(), user_id, label_id).await?;
    if !deleted {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Validates a label payload, checking name and color token lengths.
fn validate_label(payload: &LabelPayload) -> Result<(), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "Label name must be between 1 and {} characters.",
            MAX_NAME_LEN
        )));
    }
    let color = payload.color.trim();
    if color.is_empty() || color.len() > MAX_COLOR_LEN {
        return Err(ApiError::Validation(format!(
            "Label color must be between 1 and {} characters.",
            MAX_COLOR_LEN
        )));
    }
    Ok(())
}
