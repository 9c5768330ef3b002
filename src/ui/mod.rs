//! User interface module - status lines, warnings and the build badge.
//!
//! Logs go through `tracing`; this module prints what a person running the
//! binary is meant to read.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_badge, display_error, display_registry, display_status, display_success,
    display_warning, format_badge, format_registry,
};
