//! Pure formatting functions for UI output.
//!
//! `format_*` functions build plain strings and are what the tests look at;
//! `display_*` functions add colors and print.

use console::style;

use crate::domain::BuildResult;
use crate::engine::BuildSummary;
use crate::registry::BranchRegistry;
use crate::warning::WorkflowWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a workflow warning to the user.
pub fn display_warning(warning: &WorkflowWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One-line badge for a finished build, e.g. `start-release 2.3 [release build] (dry run)`
pub fn format_badge(summary: &BuildSummary) -> String {
    let mut badge = summary.action.to_string();
    if let Some(version) = &summary.version {
        badge.push(' ');
        badge.push_str(version);
    }
    if summary.release_build {
        badge.push_str(" [release build]");
    }
    if summary.main_build_omitted {
        badge.push_str(" [main build omitted]");
    }
    if summary.dry_run {
        badge.push_str(" (dry run)");
    }
    badge
}

/// Print the badge, colored by the build result.
pub fn display_badge(summary: &BuildSummary) {
    let result = match summary.result {
        BuildResult::Success => style(summary.result.name()).green().bold(),
        BuildResult::Unstable => style(summary.result.name()).yellow().bold(),
        _ => style(summary.result.name()).red().bold(),
    };
    println!("\n{} {}\n", result, style(format_badge(summary)).bold());
}

/// Registry as aligned rows: branch, result, build version, last release
pub fn format_registry(registry: &BranchRegistry) -> Vec<String> {
    let width = registry
        .all()
        .iter()
        .map(|record| record.display_name().len())
        .max()
        .unwrap_or(0);

    registry
        .all()
        .iter()
        .map(|record| {
            let release = match (
                &record.last_release_version,
                &record.last_release_version_commit,
            ) {
                (Some(version), Some(commit)) => {
                    format!("{} @ {}", version, commit.chars().take(7).collect::<String>())
                }
                (Some(version), None) => version.clone(),
                _ => "-".to_string(),
            };
            format!(
                "{:<width$}  {:<9}  {:<16}  {}",
                record.display_name(),
                record.last_build_result.name(),
                record.last_build_version.as_deref().unwrap_or("-"),
                release,
                width = width
            )
        })
        .collect()
}

/// Display the tracked branches.
pub fn display_registry(registry: &BranchRegistry) {
    if registry.is_empty() {
        display_status("No branches tracked yet");
        return;
    }
    println!("{}", style("Tracked branches:").bold());
    for line in format_registry(registry) {
        println!("  {}", line);
    }
}
