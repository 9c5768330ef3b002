use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;

use gitflow_build::cli::{run_workflow, WorkflowArgs, WorkflowCommand};
use gitflow_build::config::{self, Config};
use gitflow_build::domain::BuildResult;
use gitflow_build::git::{Git2Vcs, VcsClient};
use gitflow_build::host::{BuildHost, LocalHost};
use gitflow_build::telemetry::init_tracing;
use gitflow_build::ui;
use gitflow_build::updater::ManifestUpdater;
use gitflow_build::warning::WorkflowWarning;

#[derive(Parser)]
#[command(
    name = "gitflow-build",
    version,
    about = "Run gitflow release and hotfix workflows around a build"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Run locally without pushing or updating the branch registry"
    )]
    dry_run: bool,

    #[arg(long, global = true, help = "Write logs as JSON")]
    json_logs: bool,

    #[arg(short, long, global = true, help = "Log debug output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a branch without any gitflow action
    Build {
        #[arg(short, long, help = "Remote branch to build, e.g. origin/develop")]
        branch: Option<String>,
    },
    /// Cut a release branch off develop
    StartRelease {
        #[arg(long, help = "Release version, e.g. 2.3")]
        release_version: Option<String>,
        #[arg(long, help = "Version the release branch continues with")]
        next_patch_version: Option<String>,
        #[arg(long, help = "Version develop continues with")]
        next_version: Option<String>,
    },
    /// Build a patch release from a release branch
    TestRelease {
        branch: String,
        #[arg(long, help = "Patch release version, e.g. 2.3.1")]
        version: Option<String>,
        #[arg(long, help = "Version the branch continues with")]
        next_patch_version: Option<String>,
    },
    /// Merge a release branch's last patch release into master
    PublishRelease {
        branch: String,
        #[arg(long)]
        version: Option<String>,
        #[arg(long, help = "Commit of the patch release")]
        commit: Option<String>,
    },
    /// Delete a release branch
    FinishRelease {
        branch: String,
        #[arg(long, help = "Continue the release as a hotfix branch first")]
        start_hotfix: bool,
    },
    /// Cut a hotfix branch off master
    StartHotfix {
        #[arg(long, help = "Hotfix version, e.g. 2.3")]
        hotfix_version: Option<String>,
        #[arg(long, help = "Version the hotfix branch continues with")]
        next_patch_version: Option<String>,
    },
    /// Build a patch release from a hotfix branch
    TestHotfix {
        branch: String,
        #[arg(long, help = "Patch release version, e.g. 2.3.1")]
        version: Option<String>,
        #[arg(long, help = "Version the branch continues with")]
        next_patch_version: Option<String>,
    },
    /// Merge a hotfix branch's last patch release into master (and develop)
    PublishHotfix {
        branch: String,
        #[arg(long)]
        version: Option<String>,
        #[arg(long, help = "Commit of the patch release")]
        commit: Option<String>,
        #[arg(long, help = "Do not merge into develop")]
        skip_develop: bool,
        #[arg(long, help = "Delete the hotfix branch afterwards")]
        finish: bool,
    },
    /// Delete a hotfix branch
    FinishHotfix { branch: String },
    /// Show the tracked branches as of the last build
    Branches,
}

impl Command {
    fn into_workflow(self) -> Option<WorkflowCommand> {
        let command = match self {
            Command::Build { .. } => WorkflowCommand::Build,
            Command::StartRelease {
                release_version,
                next_patch_version,
                next_version,
            } => WorkflowCommand::StartRelease {
                release_version,
                next_patch_development_version: next_patch_version,
                next_development_version: next_version,
            },
            Command::TestRelease {
                branch,
                version,
                next_patch_version,
            } => WorkflowCommand::TestRelease {
                branch,
                patch_release_version: version,
                next_patch_development_version: next_patch_version,
            },
            Command::PublishRelease {
                branch,
                version,
                commit,
            } => WorkflowCommand::PublishRelease {
                branch,
                version,
                commit,
            },
            Command::FinishRelease {
                branch,
                start_hotfix,
            } => WorkflowCommand::FinishRelease {
                branch,
                start_hotfix,
            },
            Command::StartHotfix {
                hotfix_version,
                next_patch_version,
            } => WorkflowCommand::StartHotfix {
                hotfix_version,
                next_patch_development_version: next_patch_version,
            },
            Command::TestHotfix {
                branch,
                version,
                next_patch_version,
            } => WorkflowCommand::TestHotfix {
                branch,
                patch_release_version: version,
                next_patch_development_version: next_patch_version,
            },
            Command::PublishHotfix {
                branch,
                version,
                commit,
                skip_develop,
                finish,
            } => WorkflowCommand::PublishHotfix {
                branch,
                version,
                commit,
                skip_develop,
                finish,
            },
            Command::FinishHotfix { branch } => WorkflowCommand::FinishHotfix { branch },
            Command::Branches => return None,
        };
        Some(command)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(
        args.json_logs,
        if args.verbose { Level::DEBUG } else { Level::INFO },
    );

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let mut vcs = match Git2Vcs::open(".") {
        Ok(repo) => repo,
        Err(e) => {
            ui::display_error(&format!("Git repository error: {}", e));
            std::process::exit(1);
        }
    };
    let workdir = vcs
        .workdir()
        .map(Path::to_path_buf)
        .context("Repository has no working directory")?;

    let build_branch = match &args.command {
        Command::Build {
            branch: Some(branch),
        } => Some(branch.clone()),
        _ => vcs
            .current_branch()
            .map(|branch| format!("{}/{}", config.remote.alias, branch)),
    };

    let mut host = LocalHost::new(
        workdir.join(&config.behavior.history_dir),
        config.behavior.build_command.clone(),
    )?
    .with_working_dir(&workdir);
    if let Some(branch) = build_branch {
        host = host.with_branch(branch);
    }

    let Some(command) = args.command.into_workflow() else {
        list_branches(&host)?;
        return Ok(());
    };

    fetch(&mut vcs, &config);

    let mut updater = ManifestUpdater::new(&workdir, config.versions.files.clone());
    let workflow = WorkflowArgs {
        command,
        dry_run: args.dry_run,
    };

    let summary = match run_workflow(&workflow, &config, &mut vcs, &mut updater, &mut host) {
        Ok(summary) => summary,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };

    for warning in &summary.warnings {
        ui::display_warning(warning);
    }
    ui::display_badge(&summary);

    if summary.result != BuildResult::Success {
        std::process::exit(1);
    }
    Ok(())
}

/// Refresh remote-tracking branches; failures only warn and local data is used
fn fetch(vcs: &mut Git2Vcs, config: &Config) {
    let remote = config.remote.alias.as_str();
    ui::display_status(&format!("Fetching latest data from {}...", remote));
    match vcs.fetch(remote) {
        Ok(()) => ui::display_success(&format!("Fetched latest data from {}", remote)),
        Err(e) => ui::display_warning(&WorkflowWarning::fetch_failed(remote, &e.to_string())),
    }
}

fn list_branches(host: &LocalHost) -> Result<()> {
    match host.previous_build_registry()? {
        Some(registry) => ui::display_registry(&registry),
        None => ui::display_status("No build has recorded any branches yet"),
    }
    Ok(())
}
