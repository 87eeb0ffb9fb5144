use sqlx::PgPool;
use uuid::Uuid;

use crate::models::label::LabelRow;
use crate::services::error::ServiceError;

pub async fn list_labels_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<LabelRow>, ServiceError> {
    let rows = sqlx::query_as::<_, LabelRow>(
        r#"
        SELECT id, user_id, name, color, description
        FROM labels
        WHERE user_id = $1
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_label_for_user(
    pool: &PgPool,
    user_id: Uuid,
    label_id: Uuid,
) -> Result<Option<LabelRow>, ServiceError> {
    let row = sqlx::query_as::<_, LabelRow>(
        r#"
        SELECT id, user_id, name, color, description
        FROM labels
        WHERE user_id = $1 AND id = $2
        "#,
    )
    .bind(user_id)
    .bind(label_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create_label(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    color: &str,
    description: Option<&str>,
) -> Result<LabelRow, ServiceError> {
    let row = sqlx::query_as::<_, LabelRow>(
        r#"
        INSERT INTO labels (id, user_id, name, color, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, name, color, description
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .bind(color)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Updates a label in place. Returns `None` when the label does not
/// exist or belongs to someone else.
pub async fn update_label(
    pool: &PgPool,
    user_id: Uuid,
    label_id: Uuid,
    name: &str,
    color: &str,
    description: Option<&str>,
) -> Result<Option<LabelRow>, ServiceError> {
    let row = sqlx::query_as::<_, LabelRow>(
        r#"
        UPDATE labels
        SET name = $3, color = $4, description = $5
        WHERE user_id = $1 AND id = $2
        RETURNING id, user_id, name, color, description
        "#,
    )
    .bind(user_id)
    .bind(label_id)
    .bind(name)
    .bind(color)
    .bind(description)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes a label; associations cascade. Returns whether a row was
/// deleted.
pub async fn delete_label(
    pool: &PgPool,
    user_id: Uuid,
    label_id: Uuid,
) -> Result<bool, ServiceError> {
    let result = sqlx::query(
        r#"
        DELETE FROM labels
        WHERE user_id = $1 AND id = $2
        "#,
    )
    .bind(user_id)
    .bind(label_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
