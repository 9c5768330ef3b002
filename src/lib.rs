pub mod action;
pub mod cause;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod environment;
pub mod error;
pub mod escalation;
pub mod git;
pub mod host;
pub mod registry;
pub mod telemetry;
pub mod ui;
pub mod updater;
pub mod warning;

pub use error::{GitflowError, Result};
