// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! One-shot checkout commands.
//!
//! ```text
//! open_repository(config, dir)
//!   FossilCli::locate --> FossilCli::discover --> Repository::open
//!        |
//!        v
//! run_{status,commit,pull,push,update,undo,show,log}_command
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tracing::info;

use crate::cli::repo::{CommitArgs, LogArgs, ShowArgs, StatusArgs, UndoArgs, UpdateArgs};
use crate::config::Config;
use crate::error::Result;
use crate::fossil::{FossilCli, Ref, UpdateOptions};
use crate::interaction::{PushCreatesNewHeadAction, Unattended};
use crate::repository::{CommitScope, LogOptions, PushOutcome, Repository, WindowFocus};
use crate::resource::{GroupKind, StatusGroups};

/// Opens the checkout containing `dir`.
///
/// `live` keeps the incoming/outgoing poller enabled as configured; one-shot
/// commands pass `false`.
///
/// # Errors
///
/// Returns an error if Fossil cannot be found, `dir` is not inside a
/// checkout, or the initial status refresh fails.
pub async fn open_repository(config: &Config, dir: &Path, live: bool) -> Result<Repository> {
    let executable = FossilCli::locate(&config.fossil.path.to_string_lossy())?;
    let fossil = FossilCli::discover(executable, dir)
        .await
        .with_context(|| format!("no Fossil checkout at {}", dir.display()))?;

    let mut config = config.clone();
    if !live {
        config.sync.auto_in_out = false;
        config.sync.auto_refresh = false;
    }

    let repo = Repository::open(
        Arc::new(fossil),
        Arc::new(Unattended),
        config.repository_settings(),
        WindowFocus::default(),
    )
    .await?;
    Ok(repo)
}

/// Text rendering of the change groups.
#[must_use]
pub fn render_status(branch: Option<&Ref>, groups: &StatusGroups) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(branch) = branch {
        lines.push(format!("On branch {}", branch.name));
    }
    if groups.count() == 0 {
        lines.push("Nothing changed".to_string());
        return lines;
    }

    for kind in [
        GroupKind::Staging,
        GroupKind::Working,
        GroupKind::Merge,
        GroupKind::Conflict,
        GroupKind::Untracked,
    ] {
        let group = groups.get(kind);
        if group.is_empty() {
            continue;
        }
        lines.push(format!("{}:", kind.label()));
        for resource in group.resources() {
            match resource.rename() {
                Some(source) => lines.push(format!(
                    "  {:<10} {source} -> {}",
                    resource.status().as_str(),
                    resource.path()
                )),
                None => lines.push(format!(
                    "  {:<10} {}",
                    resource.status().as_str(),
                    resource.path()
                )),
            }
        }
    }
    lines
}

/// JSON rendering of the change groups.
#[must_use]
pub fn status_json(branch: Option<&Ref>, groups: &StatusGroups) -> serde_json::Value {
    let mut rendered = serde_json::Map::new();
    for kind in GroupKind::LOOKUP_ORDER {
        let entries: Vec<_> = groups
            .get(kind)
            .resources()
            .iter()
            .map(|r| {
                json!({
                    "path": r.path(),
                    "status": r.status().as_str(),
                    "rename": r.rename(),
                })
            })
            .collect();
        rendered.insert(kind.id().to_string(), json!(entries));
    }
    json!({
        "branch": branch.map(|b| b.name.as_str()),
        "count": groups.count(),
        "clean": groups.is_clean(),
        "groups": rendered,
    })
}

/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run_status_command(repo: &Repository, args: &StatusArgs) -> Result<()> {
    let branch = repo.current_branch();
    let groups = repo.groups();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status_json(branch.as_ref(), &groups))?
        );
    } else {
        for line in render_status(branch.as_ref(), &groups) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Stages `files` if given, then commits.
///
/// # Errors
///
/// Returns an error if staging or the commit fails.
pub async fn run_commit_command(repo: &Repository, args: &CommitArgs) -> Result<()> {
    let scope = if args.files.is_empty() {
        CommitScope::from(args.scope)
    } else {
        repo.stage(&args.files).await?;
        CommitScope::StagedChanges
    };
    repo.commit(&args.message, scope).await?;
    info!(scope = ?scope, "committed");
    Ok(())
}

/// # Errors
///
/// Returns an error if the pull fails.
pub async fn run_pull_command(repo: &Repository) -> Result<()> {
    repo.pull(repo.create_pull_options()).await?;
    info!("pulled");
    Ok(())
}

/// # Errors
///
/// Returns an error if the push fails for any reason other than a new
/// remote head.
pub async fn run_push_command(repo: &Repository) -> Result<()> {
    match repo.push().await? {
        PushOutcome::Pushed => info!("pushed"),
        PushOutcome::NewRemoteHead(PushCreatesNewHeadAction::Pull) => {
            info!("pulled instead of creating a new remote head");
        }
        PushOutcome::NewRemoteHead(PushCreatesNewHeadAction::Cancel) => {
            anyhow::bail!("push would create a new remote head; pull and merge first");
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the update fails.
pub async fn run_update_command(repo: &Repository, args: &UpdateArgs) -> Result<()> {
    let treeish = args.treeish.as_deref().unwrap_or_default();
    repo.update(
        treeish,
        UpdateOptions {
            discard: args.discard,
        },
    )
    .await?;
    info!(treeish, discard = args.discard, "updated");
    Ok(())
}

/// # Errors
///
/// Returns an error if the undo fails.
pub async fn run_undo_command(repo: &Repository, args: &UndoArgs) -> Result<()> {
    let details = repo.undo(args.dry_run).await?;
    for line in &details.lines {
        println!("{line}");
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the file cannot be read at that check-in.
pub async fn run_show_command(repo: &Repository, args: &ShowArgs) -> Result<()> {
    let path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()?.join(&args.path)
    };
    let content = repo.show(&path, &args.checkin).await?;
    print!("{content}");
    Ok(())
}

/// # Errors
///
/// Returns an error if the timeline query fails.
pub async fn run_log_command(repo: &Repository, args: &LogArgs) -> Result<()> {
    let file = match &args.file {
        Some(file) if file.is_relative() => Some(std::env::current_dir()?.join(file)),
        other => other.clone(),
    };
    let commits = repo
        .get_log_entries(LogOptions {
            rev_query: args.rev.clone(),
            file,
            limit: args.limit,
        })
        .await?;
    for commit in commits {
        let short = commit.hash.get(..10).unwrap_or(commit.hash.as_str());
        println!("{short} {} {} {}", commit.date, commit.author, commit.message);
    }
    Ok(())
}
