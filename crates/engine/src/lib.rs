//! Domain logic for the email-organization service: which emails a
//! workflow gathers, how a run is executed and recorded, and how the
//! classifier's suggestions become label assignments. Persistence and
//! the language-model API stay behind the traits in `store` and `llm`.

pub mod classify;
pub mod clock;
pub mod error;
pub mod filter;
pub mod llm;
pub mod model;
pub mod run;
pub mod store;

#[cfg(test)]
mod testutil;

pub use classify::classify_email;
pub use clock::{Clock, SystemClock};
pub use error::EngineError;
pub use filter::filter_emails;
pub use llm::{Classifier, Summarizer};
pub use model::{
    AssignedLabel, Email, EmailBrief, Frequency, Label, UnknownFrequency, Workflow,
    WorkflowExecution, WorkflowFilter,
};
pub use run::{execute_workflow, RunLocks};
pub use store::WorkflowStore;
