// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the checkout commands.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::repository::CommitScope;

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, Args)]
pub struct StatusArgs {
    /// Print the groups as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Which changes `commit` takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScopeArg {
    /// Everything Fossil reports as changed.
    #[default]
    All,
    /// Only staged files.
    Staged,
    /// Only unstaged working changes.
    Changes,
}

impl From<ScopeArg> for CommitScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => Self::All,
            ScopeArg::Staged => Self::StagedChanges,
            ScopeArg::Changes => Self::Changes,
        }
    }
}

/// Arguments for the `commit` command.
#[derive(Debug, Clone, Args)]
pub struct CommitArgs {
    /// Check-in comment.
    #[arg(short, long)]
    pub message: String,

    /// Files to include.
    #[arg(long, value_enum, default_value_t = ScopeArg::All)]
    pub scope: ScopeArg,

    /// Stage these files before committing (implies --scope staged).
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,
}

/// Arguments for the `update` command.
#[derive(Debug, Clone, Default, Args)]
pub struct UpdateArgs {
    /// Version to update to; tip of the current branch when omitted.
    #[arg(value_name = "TREEISH")]
    pub treeish: Option<String>,

    /// Throw away local changes.
    #[arg(long)]
    pub discard: bool,
}

/// Arguments for the `undo` command.
#[derive(Debug, Clone, Default, Args)]
pub struct UndoArgs {
    /// Only show what would be undone.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
}

/// Arguments for the `show` command.
#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// File to print.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Check-in to read the file from.
    #[arg(short = 'r', long = "checkin", default_value = "current")]
    pub checkin: String,
}

/// Arguments for the `log` command.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Only check-ins touching this file.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Start from this check-in.
    #[arg(short = 'r', long = "rev")]
    pub rev: Option<String>,

    /// Maximum number of entries.
    #[arg(short = 'n', long = "limit")]
    pub limit: Option<usize>,
}
