pub mod email;
pub mod label;
pub mod workflow;
