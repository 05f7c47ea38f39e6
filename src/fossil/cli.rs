// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! [`FossilRepository`] backed by the `fossil` executable.
//!
//! ```text
//! FossilCli::exec(args)
//!        |
//!        v
//! tokio::process::Command (cwd = checkout root, stdin = null)
//!        |
//!   exit 0? ── yes ──> stdout
//!        |
//!        no
//!        v
//! FossilError { code = classify_stderr(stderr), exit_code, stderr, command }
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{OnceLock, PoisonError, RwLock};

use futures_util::future::{BoxFuture, FutureExt};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

use super::parse::{self, TIMELINE_SEPARATOR};
use super::{
    Commit, CommitOptions, Divergence, FossilRepository, LogEntryOptions, MergeResult,
    PullOptions, Ref, RemotePath, RepoStatus, UndoDetails, UpdateOptions,
};
use crate::error::{FossilError, FossilErrorCode, FossilResult};

/// Static cache for executable paths resolved via `which`.
static EXECUTABLE_CACHE: OnceLock<RwLock<BTreeMap<String, PathBuf>>> = OnceLock::new();

fn exe_cache() -> &'static RwLock<BTreeMap<String, PathBuf>> {
    EXECUTABLE_CACHE.get_or_init(|| RwLock::new(BTreeMap::new()))
}

/// Ignore-glob settings file, relative to the checkout root.
const IGNORE_GLOB_FILE: &str = ".fossil-settings/ignore-glob";

/// Maps a Fossil error message to a structured code.
#[must_use]
pub fn classify_stderr(stderr: &str) -> Option<FossilErrorCode> {
    let lower = stderr.to_lowercase();
    let code = if lower.contains("not within an open check-out")
        || lower.contains("not within an open checkout")
    {
        FossilErrorCode::NotAFossilRepository
    } else if lower.contains("no such file") {
        FossilErrorCode::NoSuchFile
    } else if lower.contains("would fork") || lower.contains("creates new remote head") {
        FossilErrorCode::PushCreatesNewRemoteHead
    } else if lower.contains("untracked file") {
        FossilErrorCode::UntrackedFilesDiffer
    } else if lower.contains("unsaved changes") {
        FossilErrorCode::UnsavedChanges
    } else if lower.contains("authorization") {
        FossilErrorCode::NotAuthorized
    } else if lower.contains("login failed") {
        FossilErrorCode::AuthenticationFailed
    } else if lower.contains("already exists") {
        FossilErrorCode::BranchAlreadyExists
    } else {
        return None;
    };
    Some(code)
}

/// Indented file names listed after an "untracked file" complaint.
#[must_use]
pub fn untracked_filenames(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .skip_while(|line| !line.to_lowercase().contains("untracked file"))
        .skip(1)
        .take_while(|line| line.starts_with(char::is_whitespace))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Runs `fossil` subcommands in one checkout.
#[derive(Debug, Clone)]
pub struct FossilCli {
    executable: PathBuf,
    root: PathBuf,
}

impl FossilCli {
    pub fn new(executable: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            root: root.into(),
        }
    }

    /// Resolves `program` through `PATH` unless it already names a path.
    ///
    /// Results are cached for subsequent lookups of the same program.
    ///
    /// # Errors
    ///
    /// Returns a [`FossilError`] when the executable cannot be found.
    pub fn locate(program: &str) -> FossilResult<PathBuf> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            return Ok(candidate.to_path_buf());
        }

        {
            let cache = exe_cache().read().unwrap_or_else(PoisonError::into_inner);
            if let Some(path) = cache.get(program) {
                return Ok(path.clone());
            }
        }

        let path = which::which(program)
            .map_err(|e| FossilError::new(format!("fossil executable '{program}' not found: {e}")))?;
        exe_cache()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(program.to_string(), path.clone());
        Ok(path)
    }

    /// Finds the checkout root containing `dir` via `fossil info`.
    ///
    /// # Errors
    ///
    /// Returns [`FossilErrorCode::NotAFossilRepository`] when `dir` is not
    /// inside an open checkout.
    pub async fn discover(executable: impl Into<PathBuf>, dir: &Path) -> FossilResult<Self> {
        let probe = Self::new(executable, dir);
        let info = probe.exec(&["info"]).await?;
        let root = info
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.trim() == "local-root")
            .map(|(_, value)| PathBuf::from(value.trim()))
            .ok_or_else(|| {
                FossilError::new(format!("{} is not an open checkout", dir.display()))
                    .with_code(FossilErrorCode::NotAFossilRepository)
            })?;
        debug!(root = %root.display(), "discovered checkout");
        Ok(Self::new(probe.executable, root))
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut cmd = format!("{}", self.executable.display());
        for arg in args {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Runs one subcommand and returns its stdout.
    async fn exec(&self, args: &[&str]) -> FossilResult<String> {
        let cmd_line = self.command_line(args);
        debug!(cmd = %cmd_line, cwd = %self.root.display(), "exec");

        let output = Command::new(&self.executable)
            .args(args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                FossilError::new(format!("failed to spawn: {e}")).with_command(cmd_line.clone())
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            trace!(cmd = %cmd_line, bytes = stdout.len(), "exec finished");
            return Ok(stdout);
        }

        let exit_code = output.status.code().unwrap_or(-1);
        // Some subcommands report failures on stdout.
        let report = if stderr.trim().is_empty() { &stdout } else { &stderr };
        debug!(cmd = %cmd_line, exit_code, stderr = %report.trim(), "exec failed");

        let mut err = FossilError::new("Failed to execute fossil")
            .with_exit_code(exit_code)
            .with_stderr(report.clone())
            .with_command(cmd_line);
        if let Some(code) = classify_stderr(report) {
            err = err.with_code(code);
            if code == FossilErrorCode::UntrackedFilesDiffer {
                err.set_filenames(untracked_filenames(report));
            }
        }
        Err(err)
    }

    async fn exec_with_paths(&self, command: &str, paths: &[String]) -> FossilResult<String> {
        let mut args = vec![command];
        args.extend(paths.iter().map(String::as_str));
        self.exec(&args).await
    }

    async fn append_ignore_globs(&self, paths: &[String]) -> FossilResult<()> {
        let file = self.root.join(IGNORE_GLOB_FILE);
        let io_err = |e: std::io::Error| {
            FossilError::new(format!("failed to update {}: {e}", file.display()))
        };

        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let mut out = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
            .await
            .map_err(io_err)?;
        let mut text = String::new();
        for path in paths {
            text.push_str(path);
            text.push('\n');
        }
        out.write_all(text.as_bytes()).await.map_err(io_err)?;
        out.flush().await.map_err(io_err)?;
        debug!(file = %file.display(), count = paths.len(), "ignore globs appended");
        Ok(())
    }

    async fn do_update(&self, treeish: &str, options: UpdateOptions) -> FossilResult<()> {
        match (options.discard, treeish.is_empty()) {
            (true, true) => self.exec(&["revert"]).await?,
            (true, false) => self.exec(&["checkout", treeish, "--force"]).await?,
            (false, true) => self.exec(&["update"]).await?,
            (false, false) => self.exec(&["update", treeish]).await?,
        };
        Ok(())
    }

    async fn do_commit(&self, message: &str, options: &CommitOptions) -> FossilResult<()> {
        let mut args = vec!["commit", "-m", message];
        if let Some(user) = options.user.as_deref() {
            args.extend(["--user-override", user]);
        }
        args.extend(options.file_list.iter().map(String::as_str));
        self.exec(&args).await?;
        Ok(())
    }

    async fn do_close(&self) -> FossilResult<Option<String>> {
        match self.exec(&["close"]).await {
            Ok(_) => Ok(None),
            Err(err) if err.code() == Some(FossilErrorCode::UnsavedChanges) => {
                Ok(Some(err.normalized_message()))
            }
            Err(err) => Err(err),
        }
    }

    async fn do_pull(&self, options: PullOptions) -> FossilResult<()> {
        self.exec(&["pull"]).await?;
        if options.auto_update {
            self.exec(&["update"]).await?;
        }
        Ok(())
    }

    async fn do_log_entries(&self, options: &LogEntryOptions) -> FossilResult<Vec<Commit>> {
        let limit = options.limit.to_string();
        let format = format!("%H{0}%a{0}%d{0}%b{0}%c", TIMELINE_SEPARATOR);
        let mut args = vec!["timeline"];
        if !options.rev_query.is_empty() {
            args.extend(["before", options.rev_query.as_str()]);
        }
        args.extend(["-n", limit.as_str(), "-t", "ci", "-F", format.as_str()]);
        if let Some(path) = options.file_path.as_deref() {
            args.extend(["-p", path]);
        }
        let raw = self.exec(&args).await?;
        Ok(parse::parse_timeline(&raw))
    }
}

impl FossilRepository for FossilCli {
    fn root(&self) -> &Path {
        &self.root
    }

    fn add<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>> {
        async move { self.exec_with_paths("add", paths).await.map(drop) }.boxed()
    }

    fn remove<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>> {
        async move { self.exec_with_paths("forget", paths).await.map(drop) }.boxed()
    }

    fn ignore<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>> {
        self.append_ignore_globs(paths).boxed()
    }

    fn commit<'a>(
        &'a self,
        message: &'a str,
        options: &'a CommitOptions,
    ) -> BoxFuture<'a, FossilResult<()>> {
        self.do_commit(message, options).boxed()
    }

    fn revert<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, FossilResult<()>> {
        async move { self.exec_with_paths("revert", paths).await.map(drop) }.boxed()
    }

    fn clean(&self) -> BoxFuture<'_, FossilResult<()>> {
        async move { self.exec(&["clean"]).await.map(drop) }.boxed()
    }

    fn branch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, FossilResult<()>> {
        async move {
            self.exec(&["branch", "new", name, "current"])
                .await
                .map(drop)
        }
        .boxed()
    }

    fn update<'a>(
        &'a self,
        treeish: &'a str,
        options: UpdateOptions,
    ) -> BoxFuture<'a, FossilResult<()>> {
        self.do_update(treeish, options).boxed()
    }

    fn close(&self) -> BoxFuture<'_, FossilResult<Option<String>>> {
        self.do_close().boxed()
    }

    fn undo(&self, dry_run: bool) -> BoxFuture<'_, FossilResult<UndoDetails>> {
        async move {
            let args: &[&str] = if dry_run {
                &["undo", "--dry-run"]
            } else {
                &["undo"]
            };
            let raw = self.exec(args).await?;
            Ok(UndoDetails {
                dry_run,
                lines: raw
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_owned)
                    .collect(),
            })
        }
        .boxed()
    }

    fn pull(&self, options: PullOptions) -> BoxFuture<'_, FossilResult<()>> {
        self.do_pull(options).boxed()
    }

    fn push(&self) -> BoxFuture<'_, FossilResult<()>> {
        async move { self.exec(&["push"]).await.map(drop) }.boxed()
    }

    fn merge<'a>(&'a self, rev: &'a str) -> BoxFuture<'a, FossilResult<MergeResult>> {
        async move {
            let raw = self.exec(&["merge", rev]).await?;
            Ok(parse::parse_merge_result(&raw))
        }
        .boxed()
    }

    fn cat<'a>(&'a self, path: &'a str, rev: &'a str) -> BoxFuture<'a, FossilResult<String>> {
        async move {
            if rev.is_empty() {
                self.exec(&["cat", path]).await
            } else {
                self.exec(&["cat", path, "-r", rev]).await
            }
        }
        .boxed()
    }

    fn get_status(&self) -> BoxFuture<'_, FossilResult<String>> {
        self.exec(&["status"]).boxed()
    }

    fn get_extras(&self) -> BoxFuture<'_, FossilResult<String>> {
        self.exec(&["extras"]).boxed()
    }

    fn get_summary(&self) -> BoxFuture<'_, FossilResult<RepoStatus>> {
        async move {
            let raw = self.exec(&["status"]).await?;
            Ok(parse::parse_summary(&raw))
        }
        .boxed()
    }

    fn get_current_branch(&self) -> BoxFuture<'_, FossilResult<Option<Ref>>> {
        async move {
            let raw = self.exec(&["branch", "current"]).await?;
            let name = raw.trim();
            Ok((!name.is_empty()).then(|| Ref::branch(name)))
        }
        .boxed()
    }

    fn get_branches(&self) -> BoxFuture<'_, FossilResult<Vec<Ref>>> {
        async move {
            let raw = self.exec(&["branch", "ls"]).await?;
            Ok(parse::parse_branch_lines(&raw))
        }
        .boxed()
    }

    fn get_tags(&self) -> BoxFuture<'_, FossilResult<Vec<Ref>>> {
        async move {
            let raw = self.exec(&["tag", "list"]).await?;
            Ok(parse::parse_tag_lines(&raw))
        }
        .boxed()
    }

    fn get_parents(&self) -> BoxFuture<'_, FossilResult<String>> {
        async move {
            let raw = self.exec(&["info"]).await?;
            Ok(parse::parse_parent(&raw))
        }
        .boxed()
    }

    fn get_paths(&self) -> BoxFuture<'_, FossilResult<RemotePath>> {
        async move {
            let raw = self.exec(&["remote"]).await?;
            Ok(parse::parse_remote(&raw))
        }
        .boxed()
    }

    fn get_log_entries<'a>(
        &'a self,
        options: &'a LogEntryOptions,
    ) -> BoxFuture<'a, FossilResult<Vec<Commit>>> {
        self.do_log_entries(options).boxed()
    }

    fn check_divergence(&self) -> BoxFuture<'_, FossilResult<Divergence>> {
        async move {
            let raw = self.exec(&["sync", "--dry-run"]).await?;
            Ok(parse::parse_sync_counts(&raw))
        }
        .boxed()
    }
}
