use std::collections::HashMap;

use tracing::warn;
use uuid::Uuid;

use crate::error::EngineError;
use crate::llm::Classifier;
use crate::model::Label;
use crate::store::WorkflowStore;

/// Asks the classifier which of the user's labels apply to one email
/// and persists each match as an automatic association.
///
/// A user with zero labels is rejected with `NotConfigured` before any
/// external call. Classification is best-effort: an upstream failure
/// is logged and treated as "no suggestions", unlike workflow
/// summaries where the same failure aborts the run. Suggested names
/// are matched case-insensitively against the known label set; names
/// outside it are dropped, duplicates collapse, and re-applying an
/// existing association is a no-op.
///
/// Returns the labels that were applied.
pub async fn classify_email(
    store: &dyn WorkflowStore,
    classifier: &dyn Classifier,
    user_id: Uuid,
    email_id: Uuid,
) -> Result<Vec<Label>, EngineError> {
    let labels = store.labels_for_user(user_id).await?;
    if labels.is_empty() {
        return Err(EngineError::NotConfigured);
    }

    let email = store
        .email_for_user(user_id, email_id)
        .await?
        .ok_or(EngineError::NotFound)?;

    let candidates: Vec<String> = labels.iter().map(|l| l.name.clone()).collect();
    let body = email.body.as_deref().unwrap_or(&email.preview);

    let suggested = match classifier.classify(&email.subject, body, &candidates).await {
        Ok(names) => names,
        Err(err) => {
            warn!(email_id = %email.id, error = %err, "classifier call failed; no labels applied");
            Vec::new()
        }
    };

    let by_name: HashMap<String, &Label> = labels
        .iter()
        .map(|label| (label.name.to_lowercase(), label))
        .collect();

    let mut applied: Vec<Label> = Vec::new();
    for name in suggested {
        let Some(label) = by_name.get(&name.to_lowercase()) else {
            // The model sometimes answers with names it was never offered.
            continue;
        };
        if applied.iter().any(|a| a.id == label.id) {
            continue;
        }
        store.assign_label(email.id, label.id, true).await?;
        applied.push((*label).clone());
    }

    Ok(applied)
}
