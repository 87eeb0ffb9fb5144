use std::collections::HashMap;

use engine::{AssignedLabel, Email};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::email::{EmailLabelRow, EmailRow};
use crate::services::error::ServiceError;

fn assemble(row: EmailRow, labels: Vec<AssignedLabel>) -> Email {
    Email {
        id: row.id,
        account_id: row.account_id,
        subject: row.subject,
        sender_name: row.sender_name,
        sender_address: row.sender_address,
        received_at: row.received_at,
        preview: row.preview,
        body: row.body,
        is_read: row.is_read,
        labels,
    }
}

/// Lists all of a user's emails, newest-first, each carrying its label
/// associations. Ownership is enforced through the account join.
pub async fn list_emails_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Email>, ServiceError> {
    let rows = sqlx::query_as::<_, EmailRow>(
        r#"
        SELECT e.id, e.account_id, e.subject, e.sender_name, e.sender_address,
               e.received_at, e.preview, e.body, e.is_read
        FROM emails e
        JOIN email_accounts a ON e.account_id = a.id
        WHERE a.user_id = $1
        ORDER BY e.received_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let label_rows = sqlx::query_as::<_, EmailLabelRow>(
        r#"
        SELECT el.email_id, el.label_id, l.name, el.is_auto
        FROM email_labels el
        JOIN labels l ON el.label_id = l.id
        JOIN emails e ON el.email_id = e.id
        JOIN email_accounts a ON e.account_id = a.id
        WHERE a.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut labels_by_email: HashMap<Uuid, Vec<AssignedLabel>> = HashMap::new();
    for row in label_rows {
        labels_by_email
            .entry(row.email_id)
            .or_default()
            .push(AssignedLabel {
                label_id: row.label_id,
                name: row.name,
                is_auto: row.is_auto,
            });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let labels = labels_by_email.remove(&row.id).unwrap_or_default();
            assemble(row, labels)
        })
        .collect())
}

/// Fetches one email with its labels, scoped to the owning user.
pub async fn get_email_for_user(
    pool: &PgPool,
    user_id: Uuid,
    email_id: Uuid,
) -> Result<Option<Email>, ServiceError> {
    let row = sqlx::query_as::<_, EmailRow>(
        r#"
        SELECT e.id, e.account_id, e.subject, e.sender_name, e.sender_address,
               e.received_at, e.preview, e.body, e.is_read
        FROM emails e
        JOIN email_accounts a ON e.account_id = a.id
        WHERE a.user_id = $1 AND e.id = $2
        "#,
    )
    .bind(user_id)
    .bind(email_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    // Ownership was already checked by the email fetch above.
    let label_rows = sqlx::query_as::<_, EmailLabelRow>(
        r#"
        SELECT el.email_id, el.label_id, l.name, el.is_auto
        FROM email_labels el
        JOIN labels l ON el.label_id = l.id
        WHERE el.email_id = $1
        "#,
    )
    .bind(email_id)
    .fetch_all(pool)
    .await?;

    let labels = label_rows
        .into_iter()
        .map(|r| AssignedLabel {
            label_id: r.label_id,
            name: r.name,
            is_auto: r.is_auto,
        })
        .collect();

    Ok(Some(assemble(row, labels)))
}

/// Sets the read flag on an email owned by the user. Returns whether a
/// row was touched.
pub async fn mark_email_read(
    pool: &PgPool,
    user_id: Uuid,
    email_id: Uuid,
) -> Result<bool, ServiceError> {
    let result = sqlx::query(
        r#"
        UPDATE emails e
        SET is_read = TRUE
        FROM email_accounts a
        WHERE e.account_id = a.id AND a.user_id = $1 AND e.id = $2
        "#,
    )
    .bind(user_id)
    .bind(email_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Associates a label with an email. Re-assigning an existing
/// (email, label) pair is resolved in SQL as a no-op rather than a
/// unique violation. Callers verify the owning chain first.
pub async fn assign_label(
    pool: &PgPool,
    email_id: Uuid,
    label_id: Uuid,
    is_auto: bool,
) -> Result<(), ServiceError> {
    sqlx::query(
        r#"
        INSERT INTO email_labels (email_id, label_id, is_auto)
        VALUES ($1, $2, $3)
        ON CONFLICT (email_id, label_id) DO NOTHING
        "#,
    )
    .bind(email_id)
    .bind(label_id)
    .bind(is_auto)
    .execute(pool)
    .await?;
    Ok(())
}

/// Removes a label association. Returns whether one existed.
pub async fn remove_label(
    pool: &PgPool,
    email_id: Uuid,
    label_id: Uuid,
) -> Result<bool, ServiceError> {
    let result = sqlx::query(
        r#"
        DELETE FROM email_labels
        WHERE email_id = $1 AND label_id = $2
        "#,
    )
    .bind(email_id)
    .bind(label_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
