// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fossil collaborator interface.
//!
//! ```text
//! Repository (coordinator)
//!        |
//!        v
//! dyn FossilRepository ----------------------+
//!   |                                        |
//!   v                                        v
//! FossilCli                           ScriptedFossil (tests)
//!   tokio::process + stderr classifier
//!        |
//!        v
//! parse::{parse_status_lines, parse_extras_lines,
//!         parse_summary, parse_sync_counts, ...}
//! ```
//!
//! Methods return [`BoxFuture`] so the trait stays object safe.

pub mod cli;
pub mod parse;

#[cfg(test)]
pub(crate) mod test_utils;

use std::path::Path;

use futures_util::future::BoxFuture;

use crate::error::FossilResult;
use crate::resource::FileStatus;

pub use cli::FossilCli;

/// Kind of a named reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Branch,
    Tag,
}

/// Branch or tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub kind: RefKind,
    pub name: String,
    pub commit: Option<String>,
}

impl Ref {
    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            kind: RefKind::Branch,
            name: name.into(),
            commit: None,
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            kind: RefKind::Tag,
            name: name.into(),
            commit: None,
        }
    }
}

/// Checkout summary from the status header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    pub checkout: Option<String>,
    pub parent: Option<String>,
    pub tags: Vec<String>,
    pub is_merge: bool,
}

/// Default remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePath {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOptions {
    /// Run `update` after a successful pull.
    pub auto_update: bool,
}

/// Arguments of a commit call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Empty means every change.
    pub file_list: Vec<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Throw away local changes.
    pub discard: bool,
}

/// Outcome of `undo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoDetails {
    pub dry_run: bool,
    /// Tool output, one entry per non-blank line.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeResult {
    pub unresolved_count: usize,
}

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub branch: Option<String>,
    pub message: String,
}

/// Timeline query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntryOptions {
    pub rev_query: String,
    /// Repository-relative file filter.
    pub file_path: Option<String>,
    pub limit: usize,
}

/// Unpulled and unpushed artifact counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Divergence {
    pub incoming: usize,
    pub outgoing: usize,
}

/// Facade over the Fossil executable for one checkout.
pub trait FossilRepository: Send + Sync {
    /// Absolute checkout root.
    fn root(&self) -> &Path;

    fn add<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>>;

    /// Stops tracking `paths`; files stay on disk.
    fn remove<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>>;

    fn ignore<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>>;

    fn commit<'a>(
        &'a self,
        message: &'a str,
        options: &'a CommitOptions,
    ) -> BoxFuture<'a, FossilResult<()>>;

    fn revert<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>>;

    fn clean(&self) -> BoxFuture<'_, FossilResult<()>>;

    fn branch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, FossilResult<()>>;

    fn update<'a>(
        &'a self,
        treeish: &'a str,
        options: UpdateOptions,
    ) -> BoxFuture<'a, FossilResult<()>>;

    /// Closes the checkout. `Some(message)` means it refused because of
    /// unsaved changes.
    fn close(&self) -> BoxFuture<'_, FossilResult<Option<String>>>;

    fn undo(&self, dry_run: bool) -> BoxFuture<'_, FossilResult<UndoDetails>>;

    fn pull(&self, options: PullOptions) -> BoxFuture<'_, FossilResult<()>>;

    fn push(&self) -> BoxFuture<'_, FossilResult<()>>;

    fn merge<'a>(&'a self, rev: &'a str) -> BoxFuture<'a, FossilResult<MergeResult>>;

    /// File content at a revision.
    fn cat<'a>(&'a self, path: &'a str, rev: &'a str) -> BoxFuture<'a, FossilResult<String>>;

    /// Raw `status` output.
    fn get_status(&self) -> BoxFuture<'_, FossilResult<String>>;

    /// Raw `extras` output.
    fn get_extras(&self) -> BoxFuture<'_, FossilResult<String>>;

    fn get_summary(&self) -> BoxFuture<'_, FossilResult<RepoStatus>>;

    fn get_current_branch(&self) -> BoxFuture<'_, FossilResult<Option<Ref>>>;

    fn get_branches(&self) -> BoxFuture<'_, FossilResult<Vec<Ref>>>;

    fn get_tags(&self) -> BoxFuture<'_, FossilResult<Vec<Ref>>>;

    fn get_parents(&self) -> BoxFuture<'_, FossilResult<String>>;

    fn get_paths(&self) -> BoxFuture<'_, FossilResult<RemotePath>>;

    fn get_log_entries<'a>(
        &'a self,
        options: &'a LogEntryOptions,
    ) -> BoxFuture<'a, FossilResult<Vec<Commit>>>;

    /// Probes the remote for unpulled and unpushed changes.
    fn check_divergence(&self) -> BoxFuture<'_, FossilResult<Divergence>>;

    fn parse_status_lines(&self, raw: &str) -> Vec<FileStatus> {
        parse::parse_status_lines(raw)
    }

    fn parse_extras_lines(&self, raw: &str) -> Vec<FileStatus> {
        parse::parse_extras_lines(raw)
    }
}

#[cfg(test)]
mod tests;
