// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scripted in-memory Fossil backend for tests.
//!
//! Records every call, serves canned output and injects failures. A method
//! can be held with [`ScriptedFossil::hold`] so tests can observe the
//! repository while the call is in flight.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::Notify;

use super::{
    Commit, CommitOptions, Divergence, FossilRepository, LogEntryOptions, MergeResult,
    PullOptions, Ref, RemotePath, RepoStatus, UndoDetails, UpdateOptions,
};
use crate::error::{FossilError, FossilResult};

#[derive(Default)]
struct Script {
    status: String,
    extras: String,
    summary: RepoStatus,
    current_branch: Option<Ref>,
    branches: Vec<Ref>,
    tags: Vec<Ref>,
    parents: String,
    paths: RemotePath,
    commits: Vec<Commit>,
    divergence: Divergence,
    files: HashMap<String, String>,
    close_message: Option<String>,
    merge: MergeResult,
    calls: Vec<String>,
    next_failures: HashMap<&'static str, VecDeque<FossilError>>,
    persistent_failures: HashMap<&'static str, FossilError>,
    holds: HashMap<&'static str, Arc<Notify>>,
}

impl Script {
    fn take_failure(&mut self, method: &str) -> Option<FossilError> {
        self.next_failures
            .get_mut(method)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.persistent_failures.get(method).cloned())
    }
}

pub(crate) struct ScriptedFossil {
    root: PathBuf,
    script: Mutex<Script>,
}

impl ScriptedFossil {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            script: Mutex::new(Script::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_status(&self, raw: &str) {
        self.lock().status = raw.to_string();
    }

    pub(crate) fn set_extras(&self, raw: &str) {
        self.lock().extras = raw.to_string();
    }

    pub(crate) fn set_current_branch(&self, name: &str) {
        self.lock().current_branch = Some(Ref::branch(name));
    }

    pub(crate) fn set_refs(&self, branches: &[&str], tags: &[&str]) {
        let mut script = self.lock();
        script.branches = branches.iter().copied().map(Ref::branch).collect();
        script.tags = tags.iter().copied().map(Ref::tag).collect();
    }

    pub(crate) fn set_parents(&self, parents: &str) {
        self.lock().parents = parents.to_string();
    }

    pub(crate) fn set_paths(&self, url: &str) {
        self.lock().paths = RemotePath {
            name: "default".to_string(),
            url: url.to_string(),
        };
    }

    pub(crate) fn set_commits(&self, commits: Vec<Commit>) {
        self.lock().commits = commits;
    }

    pub(crate) fn set_divergence(&self, incoming: usize, outgoing: usize) {
        self.lock().divergence = Divergence { incoming, outgoing };
    }

    pub(crate) fn set_file(&self, path: &str, content: &str) {
        self.lock()
            .files
            .insert(path.to_string(), content.to_string());
    }

    pub(crate) fn set_close_message(&self, message: &str) {
        self.lock().close_message = Some(message.to_string());
    }

    /// Fails the next call of `method` with `err`.
    pub(crate) fn fail_next(&self, method: &'static str, err: FossilError) {
        self.lock()
            .next_failures
            .entry(method)
            .or_default()
            .push_back(err);
    }

    /// Fails every call of `method` until [`Self::recover`].
    pub(crate) fn fail_always(&self, method: &'static str, err: FossilError) {
        self.lock().persistent_failures.insert(method, err);
    }

    pub(crate) fn recover(&self, method: &'static str) {
        self.lock().persistent_failures.remove(method);
    }

    /// Makes calls of `method` wait until the returned notifier fires.
    pub(crate) fn hold(&self, method: &'static str) -> Arc<Notify> {
        Arc::clone(
            self.lock()
                .holds
                .entry(method)
                .or_insert_with(|| Arc::new(Notify::new())),
        )
    }

    /// Every recorded call as `method arg...`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls whose method name is `method`.
    pub(crate) fn count(&self, method: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(method))
            .count()
    }

    fn call<'a, T, F>(
        &'a self,
        method: &'static str,
        detail: String,
        answer: F,
    ) -> BoxFuture<'a, FossilResult<T>>
    where
        T: Send + 'a,
        F: FnOnce(&Script) -> T + Send + 'a,
    {
        async move {
            let hold = {
                let mut script = self.lock();
                let entry = if detail.is_empty() {
                    method.to_string()
                } else {
                    format!("{method} {detail}")
                };
                script.calls.push(entry);
                script.holds.get(method).cloned()
            };
            if let Some(notify) = hold {
                notify.notified().await;
            }

            let mut script = self.lock();
            match script.take_failure(method) {
                Some(err) => Err(err),
                None => Ok(answer(&script)),
            }
        }
        .boxed()
    }
}

impl FossilRepository for ScriptedFossil {
    fn root(&self) -> &Path {
        &self.root
    }

    fn add<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>> {
        self.call("add", paths.join(" "), |_| ())
    }

    fn remove<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>> {
        self.call("remove", paths.join(" "), |_| ())
    }

    fn ignore<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>> {
        self.call("ignore", paths.join(" "), |_| ())
    }

    fn commit<'a>(
        &'a self,
        message: &'a str,
        options: &'a CommitOptions,
    ) -> BoxFuture<'a, FossilResult<()>> {
        let mut detail = format!("{message:?} [{}]", options.file_list.join(" "));
        if let Some(user) = &options.user {
            detail.push_str(" user=");
            detail.push_str(user);
        }
        self.call("commit", detail, |_| ())
    }

    fn revert<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>> {
        self.call("revert", paths.join(" "), |_| ())
    }

    fn clean(&self) -> BoxFuture<'_, FossilResult<()>> {
        self.call("clean", String::new(), |_| ())
    }

    fn branch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, FossilResult<()>> {
        self.call("branch", name.to_string(), |_| ())
    }

    fn update<'a>(
        &'a self,
        treeish: &'a str,
        options: UpdateOptions,
    ) -> BoxFuture<'a, FossilResult<()>> {
        let detail = if options.discard {
            format!("{treeish} --discard")
        } else {
            treeish.to_string()
        };
        self.call("update", detail, |_| ())
    }

    fn close(&self) -> BoxFuture<'_, FossilResult<Option<String>>> {
        self.call("close", String::new(), |s| s.close_message.clone())
    }

    fn undo(&self, dry_run: bool) -> BoxFuture<'_, FossilResult<UndoDetails>> {
        let detail = if dry_run { "--dry-run" } else { "" };
        self.call("undo", detail.to_string(), move |_| UndoDetails {
            dry_run,
            lines: vec!["UNDO file.txt".to_string()],
        })
    }

    fn pull(&self, options: PullOptions) -> BoxFuture<'_, FossilResult<()>> {
        let detail = if options.auto_update { "--update" } else { "" };
        self.call("pull", detail.to_string(), |_| ())
    }

    fn push(&self) -> BoxFuture<'_, FossilResult<()>> {
        self.call("push", String::new(), |_| ())
    }

    fn merge<'a>(&'a self, rev: &'a str) -> BoxFuture<'a, FossilResult<MergeResult>> {
        self.call("merge", rev.to_string(), |s| s.merge.clone())
    }

    fn cat<'a>(&'a self, path: &'a str, rev: &'a str) -> BoxFuture<'a, FossilResult<String>> {
        self.call("cat", format!("{path} {rev}"), move |s| {
            s.files.get(path).cloned().unwrap_or_default()
        })
    }

    fn get_status(&self) -> BoxFuture<'_, FossilResult<String>> {
        self.call("status", String::new(), |s| s.status.clone())
    }

    fn get_extras(&self) -> BoxFuture<'_, FossilResult<String>> {
        self.call("extras", String::new(), |s| s.extras.clone())
    }

    fn get_summary(&self) -> BoxFuture<'_, FossilResult<RepoStatus>> {
        self.call("summary", String::new(), |s| s.summary.clone())
    }

    fn get_current_branch(&self) -> BoxFuture<'_, FossilResult<Option<Ref>>> {
        self.call("current_branch", String::new(), |s| s.current_branch.clone())
    }

    fn get_branches(&self) -> BoxFuture<'_, FossilResult<Vec<Ref>>> {
        self.call("branches", String::new(), |s| s.branches.clone())
    }

    fn get_tags(&self) -> BoxFuture<'_, FossilResult<Vec<Ref>>> {
        self.call("tags", String::new(), |s| s.tags.clone())
    }

    fn get_parents(&self) -> BoxFuture<'_, FossilResult<String>> {
        self.call("parents", String::new(), |s| s.parents.clone())
    }

    fn get_paths(&self) -> BoxFuture<'_, FossilResult<RemotePath>> {
        self.call("paths", String::new(), |s| s.paths.clone())
    }

    fn get_log_entries<'a>(
        &'a self,
        options: &'a LogEntryOptions,
    ) -> BoxFuture<'a, FossilResult<Vec<Commit>>> {
        let detail = format!(
            "{} {} {}",
            options.rev_query,
            options.limit,
            options.file_path.as_deref().unwrap_or("-")
        );
        self.call("log", detail, move |s| {
            s.commits.iter().take(options.limit).cloned().collect()
        })
    }

    fn check_divergence(&self) -> BoxFuture<'_, FossilResult<Divergence>> {
        self.call("divergence", String::new(), |s| s.divergence)
    }
}
