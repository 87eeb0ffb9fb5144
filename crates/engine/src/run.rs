use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::EngineError;
use crate::filter::filter_emails;
use crate::llm::Summarizer;
use crate::model::{EmailBrief, WorkflowExecution};
use crate::store::WorkflowStore;

/// Per-workflow mutual exclusion for executions. Overlapping calls
/// for the same workflow id are serialized, not rejected, so a second
/// trigger simply waits its turn. Entries are evicted once the last
/// holder releases them, so the map stays bounded by the number of
/// in-flight runs.
#[derive(Default)]
pub struct RunLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl RunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_workflow(&self, workflow_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(workflow_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Drops the entry when no caller still holds a clone of it. The
    /// strong count is read under the map lock, so a concurrent
    /// `for_workflow` cannot clone the entry out from under us.
    fn release(&self, workflow_id: Uuid) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = map
            .get(&workflow_id)
            .map(|entry| Arc::strong_count(entry) == 1)
            .unwrap_or(false);
        if unused {
            map.remove(&workflow_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Executes one workflow run on demand.
///
/// Load the workflow scoped to the caller, select the user's emails
/// through the workflow's filter, refuse to spend a model call on an
/// empty selection, request the summary (no retry: any upstream
/// failure is fatal for the run and nothing is persisted), then record
/// the execution and advance the last-run marker.
pub async fn execute_workflow(
    store: &dyn WorkflowStore,
    summarizer: &dyn Summarizer,
    clock: &dyn Clock,
    locks: &RunLocks,
    user_id: Uuid,
    workflow_id: Uuid,
) -> Result<WorkflowExecution, EngineError> {
    let lock = locks.for_workflow(workflow_id);
    let result = {
        let _running = lock.lock().await;
        run_once(store, summarizer, clock, user_id, workflow_id).await
    };
    drop(lock);
    locks.release(workflow_id);
    result
}

async fn run_once(
    store: &dyn WorkflowStore,
    summarizer: &dyn Summarizer,
    clock: &dyn Clock,
    user_id: Uuid,
    workflow_id: Uuid,
) -> Result<WorkflowExecution, EngineError> {
    let workflow = store
        .workflow_for_user(user_id, workflow_id)
        .await?
        .ok_or(EngineError::NotFound)?;

    let emails = store.emails_for_user(user_id).await?;
    let selected = filter_emails(&workflow.filter, emails);
    if selected.is_empty() {
        return Err(EngineError::EmptySelection);
    }

    let briefs: Vec<EmailBrief> = selected.iter().map(EmailBrief::from).collect();
    let summary = summarizer.summarize(&briefs, &workflow.prompt).await?;

    let execution = store
        .record_execution(workflow.id, &summary, selected.len() as i64, clock.now())
        .await?;

    info!(
        workflow_id = %workflow.id,
        email_count = execution.email_count,
        "workflow execution recorded"
    );
    Ok(execution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkflowFilter;
    use crate::testutil::{
        email_with_labels, fixed_time, label, workflow_with_filter, CannedSummarizer, FailingSummarizer,
        FakeStore, FixedClock,
    };

    #[tokio::test]
    async fn unknown_workflow_is_not_found() {
        let store = FakeStore::default();
        let result = execute_workflow(
            &store,
            &CannedSummarizer("unused"),
            &FixedClock(fixed_time()),
            &RunLocks::new(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        )
        .await;

        assert!(matches!(result, Err(EngineError::NotFound)));
        assert!(store.executions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_selection_writes_nothing() {
        let work = label("Work");
        let workflow = workflow_with_filter(WorkflowFilter {
            label_ids: vec![work.id],
        });
        let store = FakeStore {
            // No email carries the filtered label.
            emails: vec![email_with_labels("newsletter", &[])],
            workflows: vec![workflow.clone()],
            ..FakeStore::default()
        };

        let result = execute_workflow(
            &store,
            &CannedSummarizer("unused"),
            &FixedClock(fixed_time()),
            &RunLocks::new(),
            workflow.user_id,
            workflow.id,
        )
        .await;

        assert!(matches!(result, Err(EngineError::EmptySelection)));
        assert!(store.executions.lock().unwrap().is_empty());
        assert!(store.last_run.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn summarizer_failure_is_fatal_and_persists_nothing() {
        let work = label("Work");
        let workflow = workflow_with_filter(WorkflowFilter {
            label_ids: vec![work.id],
        });
        let store = FakeStore {
            emails: vec![email_with_labels("standup notes", &[&work])],
            workflows: vec![workflow.clone()],
            ..FakeStore::default()
        };

        let result = execute_workflow(
            &store,
            &FailingSummarizer,
            &FixedClock(fixed_time()),
            &RunLocks::new(),
            workflow.user_id,
            workflow.id,
        )
        .await;

        assert!(matches!(result, Err(EngineError::Upstream(_))));
        assert!(store.executions.lock().unwrap().is_empty());
        assert!(store.last_run.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn success_records_one_execution_with_selection_count() {
        let work = label("Work");
        let workflow = workflow_with_filter(WorkflowFilter {
            label_ids: vec![work.id],
        });
        let store = FakeStore {
            emails: vec![
                email_with_labels("standup notes", &[&work]),
                email_with_labels("quarterly review", &[&work]),
                email_with_labels("newsletter", &[]),
            ],
            workflows: vec![workflow.clone()],
            ..FakeStore::default()
        };
        let now = fixed_time();

        let execution = execute_workflow(
            &store,
            &CannedSummarizer("two work emails this week"),
            &FixedClock(now),
            &RunLocks::new(),
            workflow.user_id,
            workflow.id,
        )
        .await
        .unwrap();

        assert_eq!(execution.workflow_id, workflow.id);
        assert_eq!(execution.email_count, 2);
        assert_eq!(execution.summary, "two work emails this week");
        assert_eq!(execution.executed_at, now);
        assert_eq!(store.executions.lock().unwrap().len(), 1);
        assert_eq!(*store.last_run.lock().unwrap(), Some(now));
    }

    #[tokio::test]
    async fn storage_failure_on_record_propagates() {
        let workflow = workflow_with_filter(WorkflowFilter::default());
        let store = FakeStore {
            emails: vec![email_with_labels("newsletter", &[])],
            workflows: vec![workflow.clone()],
            fail_record: true,
            ..FakeStore::default()
        };

        let result = execute_workflow(
            &store,
            &CannedSummarizer("summary"),
            &FixedClock(fixed_time()),
            &RunLocks::new(),
            workflow.user_id,
            workflow.id,
        )
        .await;

        assert!(matches!(result, Err(EngineError::Storage(_))));
    }

    #[tokio::test]
    async fn workflow_owned_by_someone_else_is_not_found() {
        let workflow = workflow_with_filter(WorkflowFilter::default());
        let store = FakeStore {
            emails: vec![email_with_labels("newsletter", &[])],
            workflows: vec![workflow.clone()],
            ..FakeStore::default()
        };

        let result = execute_workflow(
            &store,
            &CannedSummarizer("summary"),
            &FixedClock(fixed_time()),
            &RunLocks::new(),
            Uuid::new_v4(), // not the owner
            workflow.id,
        )
        .await;

        assert!(matches!(result, Err(EngineError::NotFound)));
        assert!(store.executions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lock_entries_are_evicted_after_each_run() {
        let workflow = workflow_with_filter(WorkflowFilter::default());
        let store = FakeStore {
            emails: vec![email_with_labels("newsletter", &[])],
            workflows: vec![workflow.clone()],
            ..FakeStore::default()
        };
        let locks = RunLocks::new();

        execute_workflow(
            &store,
            &CannedSummarizer("summary"),
            &FixedClock(fixed_time()),
            &locks,
            workflow.user_id,
            workflow.id,
        )
        .await
        .unwrap();
        assert_eq!(locks.len(), 0);

        // Failed runs release their entry too.
        let result = execute_workflow(
            &store,
            &CannedSummarizer("summary"),
            &FixedClock(fixed_time()),
            &locks,
            Uuid::new_v4(),
            Uuid::new_v4(),
        )
        .await;
        assert!(matches!(result, Err(EngineError::NotFound)));
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn end_to_end_single_label_scenario() {
        // Labels = [Work], filter = [Work], one tagged email and one
        // bare email: the run covers exactly the tagged one.
        let work = label("Work");
        let workflow = workflow_with_filter(WorkflowFilter {
            label_ids: vec![work.id],
        });
        let tagged = email_with_labels("standup notes", &[&work]);
        let bare = email_with_labels("newsletter", &[]);
        let store = FakeStore {
            emails: vec![tagged.clone(), bare],
            labels: vec![work],
            workflows: vec![workflow.clone()],
            ..FakeStore::default()
        };

        let execution = execute_workflow(
            &store,
            &CannedSummarizer("one work email"),
            &FixedClock(fixed_time()),
            &RunLocks::new(),
            workflow.user_id,
            workflow.id,
        )
        .await
        .unwrap();

        assert_eq!(execution.email_count, 1);
        assert_eq!(store.executions.lock().unwrap().len(), 1);
    }
}
