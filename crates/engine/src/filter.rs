use crate::model::{Email, WorkflowFilter};

/// Selects the emails a workflow run covers.
///
/// With a non-empty `label_ids` list, an email qualifies if and only
/// if at least one of its assigned labels appears in the list (OR
/// semantics, not AND). With an empty list the filter is treated as
/// unrestricted and every email passes through — a deliberate,
/// documented default, which means a label-less workflow summarizes
/// the user's entire inbox.
///
/// Pure function; input order (newest-first, the store's natural
/// ordering) is preserved.
pub fn filter_emails(filter: &WorkflowFilter, emails: Vec<Email>) -> Vec<Email> {
    if filter.label_ids.is_empty() {
        return emails;
    }
    emails
        .into_iter()
        .filter(|email| {
            email
                .labels
                .iter()
                .any(|assigned| filter.label_ids.contains(&assigned.label_id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{email_with_labels, label};
    use uuid::Uuid;

    #[test]
    fn matches_on_any_listed_label() {
        let work = label("Work");
        let travel = label("Travel");
        let tagged = email_with_labels("standup notes", &[&work]);
        let other = email_with_labels("boarding pass", &[&travel]);
        let bare = email_with_labels("newsletter", &[]);

        let filter = WorkflowFilter {
            label_ids: vec![work.id],
        };
        let selected = filter_emails(&filter, vec![tagged.clone(), other, bare]);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, tagged.id);
    }

    #[test]
    fn or_semantics_across_multiple_label_ids() {
        let work = label("Work");
        let travel = label("Travel");
        let a = email_with_labels("standup notes", &[&work]);
        let b = email_with_labels("boarding pass", &[&travel]);
        let c = email_with_labels("newsletter", &[]);

        let filter = WorkflowFilter {
            label_ids: vec![work.id, travel.id],
        };
        let selected = filter_emails(&filter, vec![a.clone(), b.clone(), c]);

        assert_eq!(
            selected.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
    }

    #[test]
    fn empty_filter_passes_everything_through() {
        let work = label("Work");
        let a = email_with_labels("standup notes", &[&work]);
        let b = email_with_labels("newsletter", &[]);

        let selected = filter_emails(&WorkflowFilter::default(), vec![a.clone(), b.clone()]);

        assert_eq!(
            selected.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
    }

    #[test]
    fn never_invents_emails() {
        let filter = WorkflowFilter {
            label_ids: vec![Uuid::new_v4()],
        };
        assert!(filter_emails(&filter, Vec::new()).is_empty());

        let bare = email_with_labels("newsletter", &[]);
        assert!(filter_emails(&filter, vec![bare]).is_empty());
    }

    #[test]
    fn preserves_input_order() {
        let work = label("Work");
        let newest = email_with_labels("first", &[&work]);
        let older = email_with_labels("second", &[&work]);
        let oldest = email_with_labels("third", &[&work]);

        let filter = WorkflowFilter {
            label_ids: vec![work.id],
        };
        let selected = filter_emails(
            &filter,
            vec![newest.clone(), older.clone(), oldest.clone()],
        );

        assert_eq!(
            selected.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![newest.id, older.id, oldest.id]
        );
    }
}
