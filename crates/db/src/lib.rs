//! PostgreSQL persistence: row models, per-entity query services, and
//! the `PgStore` adapter that backs `engine::WorkflowStore`.

pub mod models;
pub mod services;

mod store;

pub use store::PgStore;
