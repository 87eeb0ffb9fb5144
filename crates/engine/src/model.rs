use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One label attached to an email, with the flag distinguishing
/// model-assigned from manual assignment.
#[derive(Debug, Clone, Serialize)]
pub struct AssignedLabel {
    pub label_id: Uuid,
    pub name: String,
    pub is_auto: bool,
}

/// A synced email together with its label associations. Immutable
/// except for the read flag and its labels.
#[derive(Debug, Clone, Serialize)]
pub struct Email {
    pub id: Uuid,
    pub account_id: Uuid,
    pub subject: String,
    pub sender_name: String,
    pub sender_address: String,
    pub received_at: DateTime<Utc>,
    pub preview: String,
    pub body: Option<String>,
    pub is_read: bool,
    pub labels: Vec<AssignedLabel>,
}

/// A user-defined label.
#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
}

/// How often a workflow is nominally due to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
}

impl Frequency {
    /// The gap between nominal runs.
    pub fn interval(self) -> Duration {
        match self {
            Frequency::Weekly => Duration::days(7),
            Frequency::Biweekly => Duration::days(14),
        }
    }

    /// Computes the next nominal run time from a given instant.
    pub fn next_run_after(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.interval()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown frequency: {0}")]
pub struct UnknownFrequency(pub String);

impl std::str::FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            other => Err(UnknownFrequency(other.to_string())),
        }
    }
}

/// A workflow's filter criteria. An empty `label_ids` list is the
/// documented permissive default: the workflow covers the whole inbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowFilter {
    #[serde(default)]
    pub label_ids: Vec<Uuid>,
}

/// A saved configuration describing which emails to gather and how to
/// summarize them, on a nominal recurring cadence. Nothing in this
/// service fires runs when `next_run_at` elapses; execution is always
/// triggered on demand.
#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub filter: WorkflowFilter,
    pub prompt: String,
    pub active: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: DateTime<Utc>,
}

/// One completed run of a workflow. Append-only.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowExecution {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub summary: String,
    pub email_count: i64,
    pub executed_at: DateTime<Utc>,
}

/// The slice of an email handed to the summarizer.
#[derive(Debug, Clone)]
pub struct EmailBrief {
    pub subject: String,
    pub sender: String,
    pub preview: String,
}

impl From<&Email> for EmailBrief {
    fn from(email: &Email) -> Self {
        let sender = if email.sender_name.is_empty() {
            email.sender_address.clone()
        } else {
            format!("{} <{}>", email.sender_name, email.sender_address)
        };
        EmailBrief {
            subject: email.subject.clone(),
            sender,
            preview: email.preview.clone(),
        }
    }
}
