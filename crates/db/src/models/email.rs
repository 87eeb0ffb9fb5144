use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct EmailRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub subject: String,
    pub sender_name: String,
    pub sender_address: String,
    pub received_at: DateTime<Utc>,
    pub preview: String,
    pub body: Option<String>,
    pub is_read: bool,
}

/// One (email, label) association joined with the label's name.
#[derive(Debug, FromRow)]
pub struct EmailLabelRow {
    pub email_id: Uuid,
    pub label_id: Uuid,
    pub name: String,
    pub is_auto: bool,
}
