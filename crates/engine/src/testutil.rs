//! In-memory collaborator fakes shared by the engine's unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::EngineError;
use crate::llm::{Classifier, Summarizer};
use crate::model::{
    AssignedLabel, Email, EmailBrief, Frequency, Label, Workflow, WorkflowExecution,
    WorkflowFilter,
};
use crate::store::WorkflowStore;

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn label(name: &str) -> Label {
    Label {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: name.to_string(),
        color: "blue".to_string(),
        description: None,
    }
}

pub fn email_with_labels(subject: &str, labels: &[&Label]) -> Email {
    Email {
        id: Uuid::new_v4(),
        account_id: Uuid::new_v4(),
        subject: subject.to_string(),
        sender_name: "Ada Lovelace".to_string(),
        sender_address: "ada@example.com".to_string(),
        received_at: fixed_time(),
        preview: format!("{} preview", subject),
        body: None,
        is_read: false,
        labels: labels
            .iter()
            .map(|l| AssignedLabel {
                label_id: l.id,
                name: l.name.clone(),
                is_auto: false,
            })
            .collect(),
    }
}

pub fn workflow_with_filter(filter: WorkflowFilter) -> Workflow {
    let now = fixed_time();
    Workflow {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: "Weekly digest".to_string(),
        description: None,
        frequency: Frequency::Weekly,
        filter,
        prompt: "Summarize what happened this week".to_string(),
        active: true,
        last_run_at: None,
        next_run_at: Frequency::Weekly.next_run_after(now),
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub emails: Vec<Email>,
    pub labels: Vec<Label>,
    pub workflows: Vec<Workflow>,
    pub executions: Mutex<Vec<WorkflowExecution>>,
    pub assignments: Mutex<Vec<(Uuid, Uuid, bool)>>,
    pub last_run: Mutex<Option<DateTime<Utc>>>,
    pub fail_record: bool,
}

#[async_trait]
impl WorkflowStore for FakeStore {
    async fn emails_for_user(&self, _user_id: Uuid) -> Result<Vec<Email>, EngineError> {
        Ok(self.emails.clone())
    }

    async fn email_for_user(
        &self,
        _user_id: Uuid,
        email_id: Uuid,
    ) -> Result<Option<Email>, EngineError> {
        Ok(self.emails.iter().find(|e| e.id == email_id).cloned())
    }

    async fn labels_for_user(&self, _user_id: Uuid) -> Result<Vec<Label>, EngineError> {
        Ok(self.labels.clone())
    }

    async fn workflow_for_user(
        &self,
        user_id: Uuid,
        workflow_id: Uuid,
    ) -> Result<Option<Workflow>, EngineError> {
        Ok(self
            .workflows
            .iter()
            .find(|w| w.id == workflow_id && w.user_id == user_id)
            .cloned())
    }

    async fn record_execution(
        &self,
        workflow_id: Uuid,
        summary: &str,
        email_count: i64,
        executed_at: DateTime<Utc>,
    ) -> Result<WorkflowExecution, EngineError> {
        if self.fail_record {
            return Err(EngineError::Storage("store offline".to_string()));
        }
        let execution = WorkflowExecution {
            id: Uuid::new_v4(),
            workflow_id,
            summary: summary.to_string(),
            email_count,
            executed_at,
        };
        self.executions.lock().unwrap().push(execution.clone());
        *self.last_run.lock().unwrap() = Some(executed_at);
        Ok(execution)
    }

    async fn assign_label(
        &self,
        email_id: Uuid,
        label_id: Uuid,
        is_auto: bool,
    ) -> Result<(), EngineError> {
        let mut assignments = self.assignments.lock().unwrap();
        // Duplicate (email, label) pairs are a no-op, like the
        // ON CONFLICT DO NOTHING in the real store.
        if !assignments
            .iter()
            .any(|(e, l, _)| *e == email_id && *l == label_id)
        {
            assignments.push((email_id, label_id, is_auto));
        }
        Ok(())
    }
}

pub struct CannedSummarizer(pub &'static str);

#[async_trait]
impl Summarizer for CannedSummarizer {
    async fn summarize(
        &self,
        _emails: &[EmailBrief],
        _prompt: &str,
    ) -> Result<String, EngineError> {
        Ok(self.0.to_string())
    }
}

pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(
        &self,
        _emails: &[EmailBrief],
        _prompt: &str,
    ) -> Result<String, EngineError> {
        Err(EngineError::Upstream("model unavailable".to_string()))
    }
}

pub struct CannedClassifier {
    names: Vec<String>,
    calls: AtomicUsize,
}

impl CannedClassifier {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for CannedClassifier {
    async fn classify(
        &self,
        _subject: &str,
        _body: &str,
        _candidates: &[String],
    ) -> Result<Vec<String>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.names.clone())
    }
}

pub struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(
        &self,
        _subject: &str,
        _body: &str,
        _candidates: &[String],
    ) -> Result<Vec<String>, EngineError> {
        Err(EngineError::Upstream("model unavailable".to_string()))
    }
}
