pub mod email;
pub mod error;
pub mod label;
pub mod workflow;
