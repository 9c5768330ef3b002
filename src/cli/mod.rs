//! Glue between the command line and the workflow engine

pub mod orchestration;

pub use orchestration::{resolve_cause, run_workflow, WorkflowArgs, WorkflowCommand};
