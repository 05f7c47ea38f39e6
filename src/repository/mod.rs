// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository coordinator.
//!
//! ```text
//!  commands   fs events   poll timer   focus changes
//!      \          |           |            /
//!       v         v           v           v
//!  +----------------------------------------------+
//!  | Repository                                   |
//!  |   Throttle per method / Debouncer (fs)       |
//!  |              |                               |
//!  |              v                               |
//!  |   run(kind, action)                          |
//!  |     1. reject if Disposed                    |
//!  |     2. ops.start(kind), RunStarted           |
//!  |     3. action().await                        |
//!  |     4. refresh unless read-only              |
//!  |        (not-a-repository => Disposed)        |
//!  |     5. ops.end(kind), RunFinished  (guard)   |
//!  +----------------------------------------------+
//!              |                        |
//!              v                        v
//!     dyn FossilRepository     broadcast<RepositoryEvent>
//! ```
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! await point, so group mutations are atomic from any observer's view.

pub mod events;
mod gate;

use std::future::Future;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bon::Builder;
use tokio::sync::{broadcast, watch};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::autoinout::{AutoInOutState, AutoInOutStatus};
use crate::coalesce::{Debouncer, Throttle};
use crate::error::{FossilErrorCode, RepositoryError, SyncError, SyncResult};
use crate::fossil::{
    Commit, CommitOptions, FossilRepository, LogEntryOptions, MergeResult, PullOptions, Ref,
    RemotePath, RepoStatus, UndoDetails, UpdateOptions,
};
use crate::interaction::{Interaction, PushCreatesNewHeadAction};
use crate::operation::{OperationKind, OperationSet};
use crate::resource::{FileResource, FileStatus, GroupKind, Status, StatusGroups, group_statuses};

pub use events::{RepositoryEvent, RepositoryState, WindowFocus};

/// Default number of timeline entries fetched by [`Repository::get_log_entries`].
pub const DEFAULT_LOG_LIMIT: usize = 200;

const EVENT_CAPACITY: usize = 256;

/// Checkout database names (both spellings Fossil uses).
const CHECKOUT_DB_NAMES: &[&str] = &[".fslckout", "_FOSSIL_"];

/// SQLite side files of the checkout database.
const CHECKOUT_DB_SUFFIXES: &[&str] = &["-journal", "-wal", "-shm"];

/// Behaviour switches injected at construction.
#[derive(Debug, Clone, Builder)]
pub struct SyncSettings {
    /// React to filesystem changes.
    #[builder(setters(name = with_auto_refresh), default = true)]
    auto_refresh: bool,
    /// Passed to pull as `auto_update`.
    #[builder(setters(name = with_auto_update), default = true)]
    auto_update: bool,
    /// Start the incoming/outgoing poller on open.
    #[builder(setters(name = with_auto_in_out), default = true)]
    auto_in_out: bool,
    #[builder(setters(name = with_auto_in_out_interval), default = Duration::from_secs(180))]
    auto_in_out_interval: Duration,
    #[builder(setters(name = with_debounce), default = Duration::from_millis(1000))]
    debounce: Duration,
    /// Quiet period after a filesystem-triggered refresh.
    #[builder(setters(name = with_refresh_cooldown), default = Duration::from_secs(5))]
    refresh_cooldown: Duration,
    /// Commit user override.
    #[builder(setters(name = with_username))]
    username: Option<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SyncSettings {
    #[must_use]
    pub const fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    #[must_use]
    pub const fn auto_update(&self) -> bool {
        self.auto_update
    }

    #[must_use]
    pub const fn auto_in_out(&self) -> bool {
        self.auto_in_out
    }

    #[must_use]
    pub const fn auto_in_out_interval(&self) -> Duration {
        self.auto_in_out_interval
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    #[must_use]
    pub const fn refresh_cooldown(&self) -> Duration {
        self.refresh_cooldown
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// Which changes a commit takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitScope {
    /// Everything Fossil considers changed.
    #[default]
    All,
    StagedChanges,
    Changes,
}

/// Result of [`Repository::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    /// The remote would fork; carries what the user chose.
    NewRemoteHead(PushCreatesNewHeadAction),
}

/// Timeline query as accepted by [`Repository::get_log_entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub rev_query: Option<String>,
    /// Absolute or root-relative file filter.
    pub file: Option<PathBuf>,
    pub limit: Option<usize>,
}

/// One commit with its parent and file changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDetails {
    pub commit: Commit,
    pub parent: String,
    pub files: Vec<FileStatus>,
}

#[derive(Default)]
struct State {
    lifecycle: RepositoryState,
    groups: StatusGroups,
    current_branch: Option<Ref>,
    refs: Vec<Ref>,
    repo_status: Option<RepoStatus>,
    path: RemotePath,
    auto_in_out: AutoInOutState,
}

/// One throttle per coalesced method.
struct Throttles {
    status: Throttle<()>,
    model: Throttle<()>,
    update_when_idle: Throttle<()>,
    add: Throttle<()>,
    remove: Throttle<()>,
    ignore: Throttle<()>,
    stage: Throttle<()>,
    unstage: Throttle<()>,
    commit: Throttle<()>,
    revert: Throttle<()>,
    clean: Throttle<()>,
    branch: Throttle<()>,
    update: Throttle<()>,
    close: Throttle<bool>,
    undo: Throttle<UndoDetails>,
    pull: Throttle<()>,
    push: Throttle<PushOutcome>,
    merge: Throttle<MergeResult>,
    get_path: Throttle<RemotePath>,
    get_refs: Throttle<Vec<Ref>>,
    get_parents: Throttle<String>,
    get_branches: Throttle<Vec<Ref>>,
    get_commit_details: Throttle<CommitDetails>,
    get_log_entries: Throttle<Vec<Commit>>,
    probe: Throttle<()>,
}

impl Throttles {
    fn new() -> Self {
        Self {
            status: Throttle::new("status"),
            model: Throttle::new("update_model_state"),
            update_when_idle: Throttle::new("update_when_idle_and_wait"),
            add: Throttle::new("add"),
            remove: Throttle::new("remove"),
            ignore: Throttle::new("ignore"),
            stage: Throttle::new("stage"),
            unstage: Throttle::new("unstage"),
            commit: Throttle::new("commit"),
            revert: Throttle::new("revert"),
            clean: Throttle::new("clean"),
            branch: Throttle::new("branch"),
            update: Throttle::new("update"),
            close: Throttle::new("close"),
            undo: Throttle::new("undo"),
            pull: Throttle::new("pull"),
            push: Throttle::new("push"),
            merge: Throttle::new("merge"),
            get_path: Throttle::new("get_path"),
            get_refs: Throttle::new("get_refs"),
            get_parents: Throttle::new("get_parents"),
            get_branches: Throttle::new("get_branches"),
            get_commit_details: Throttle::new("get_commit_details"),
            get_log_entries: Throttle::new("get_log_entries"),
            probe: Throttle::new("auto_in_out_probe"),
        }
    }
}

pub(crate) struct Inner {
    pub(crate) fossil: Arc<dyn FossilRepository>,
    interaction: Arc<dyn Interaction>,
    pub(crate) settings: SyncSettings,
    state: Mutex<State>,
    operations: watch::Sender<OperationSet>,
    focus: WindowFocus,
    events: broadcast::Sender<RepositoryEvent>,
    throttles: Throttles,
    fs_changes: Debouncer<()>,
    /// Cancelled on dispose; parent of every poller token.
    pub(crate) shutdown: CancellationToken,
    /// Token of the running poller task, if any.
    pub(crate) poller: Mutex<Option<CancellationToken>>,
}

/// Ends the operation and emits `RunFinished` when dropped.
struct OperationGuard<'a> {
    inner: &'a Inner,
    kind: OperationKind,
}

impl<'a> OperationGuard<'a> {
    fn start(inner: &'a Inner, kind: OperationKind) -> Self {
        inner.operations.send_modify(|ops| *ops = ops.start(kind));
        let _ = inner.events.send(RepositoryEvent::RunStarted(kind));
        debug!(operation = %kind, "run started");
        Self { inner, kind }
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        let kind = self.kind;
        self.inner.operations.send_modify(|ops| *ops = ops.end(kind));
        let _ = self.inner.events.send(RepositoryEvent::RunFinished(kind));
        debug!(operation = %kind, "run finished");
    }
}

/// Handle to one coordinated checkout. Clones share the same state.
#[derive(Clone)]
pub struct Repository {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root())
            .field("state", &self.state())
            .field("operations", &self.operations())
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Creates the coordinator without touching the checkout.
    ///
    /// Must be called inside a tokio runtime: the filesystem-change
    /// debouncer spawns its timer task here.
    pub fn new(
        fossil: Arc<dyn FossilRepository>,
        interaction: Arc<dyn Interaction>,
        settings: SyncSettings,
        focus: WindowFocus,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let debounce = settings.debounce;

        let inner = Arc::new_cyclic(|weak| {
            let weak = weak.clone();
            let fs_changes = Debouncer::new("fs_change", debounce, move |()| {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(inner) => Repository { inner }.update_when_idle_and_wait().await,
                        None => Ok(()),
                    }
                }
            });

            Inner {
                fossil,
                interaction,
                settings,
                state: Mutex::new(State::default()),
                operations: watch::Sender::new(OperationSet::new()),
                focus,
                events,
                throttles: Throttles::new(),
                fs_changes,
                shutdown: CancellationToken::new(),
                poller: Mutex::new(None),
            }
        });

        Self { inner }
    }

    /// Creates the coordinator, loads remote paths and status, and starts
    /// the incoming/outgoing poller when enabled.
    ///
    /// # Errors
    ///
    /// Returns the failure of the initial status refresh. A checkout that
    /// vanished is not an error: the repository comes back disposed.
    pub async fn open(
        fossil: Arc<dyn FossilRepository>,
        interaction: Arc<dyn Interaction>,
        settings: SyncSettings,
        focus: WindowFocus,
    ) -> SyncResult<Self> {
        let repo = Self::new(fossil, interaction, settings, focus);
        repo.get_path().await;
        repo.status().await?;
        if repo.inner.settings.auto_in_out && repo.state() == RepositoryState::Idle {
            repo.enable_auto_in_out();
        }
        info!(root = %repo.root().display(), "repository opened");
        Ok(repo)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub(crate) fn emit(&self, event: RepositoryEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    // --- Accessors ---

    #[must_use]
    pub fn root(&self) -> &Path {
        self.inner.fossil.root()
    }

    /// Last path component of the root.
    #[must_use]
    pub fn repo_name(&self) -> String {
        self.root()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Joins a repository-relative path onto the root.
    #[must_use]
    pub fn to_absolute(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    #[must_use]
    pub fn settings(&self) -> &SyncSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn state(&self) -> RepositoryState {
        self.with_state(|s| s.lifecycle)
    }

    #[must_use]
    pub fn operations(&self) -> OperationSet {
        *self.inner.operations.borrow()
    }

    /// Receiver that sees every operation-set transition.
    #[must_use]
    pub fn watch_operations(&self) -> watch::Receiver<OperationSet> {
        self.inner.operations.subscribe()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RepositoryEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn focus(&self) -> &WindowFocus {
        &self.inner.focus
    }

    /// Snapshot of all five groups.
    #[must_use]
    pub fn groups(&self) -> StatusGroups {
        self.with_state(|s| s.groups.clone())
    }

    /// Snapshot of one group's resources.
    #[must_use]
    pub fn group(&self, kind: GroupKind) -> Vec<FileResource> {
        self.with_state(|s| s.groups.get(kind).resources().to_vec())
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.with_state(|s| s.groups.count())
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.with_state(|s| s.groups.is_clean())
    }

    #[must_use]
    pub fn is_in_any_group(&self, path: &str) -> bool {
        self.with_state(|s| s.groups.is_in_any_group(path))
    }

    /// Resolves repository-relative paths, first group wins.
    #[must_use]
    pub fn map_resources<S: AsRef<str>>(&self, paths: &[S]) -> Vec<FileResource> {
        self.with_state(|s| s.groups.map_resources(paths))
    }

    #[must_use]
    pub fn current_branch(&self) -> Option<Ref> {
        self.with_state(|s| s.current_branch.clone())
    }

    #[must_use]
    pub fn refs(&self) -> Vec<Ref> {
        self.with_state(|s| s.refs.clone())
    }

    #[must_use]
    pub fn repo_status(&self) -> Option<RepoStatus> {
        self.with_state(|s| s.repo_status.clone())
    }

    /// Remote path cached by the last [`Self::get_path`].
    #[must_use]
    pub fn path(&self) -> RemotePath {
        self.with_state(|s| s.path.clone())
    }

    #[must_use]
    pub fn auto_in_out_state(&self) -> AutoInOutState {
        self.with_state(|s| s.auto_in_out.clone())
    }

    /// Applies `update` to the poller state and notifies observers.
    pub fn change_auto_in_out_state(&self, update: impl FnOnce(&mut AutoInOutState)) {
        self.with_state(|s| update(&mut s.auto_in_out));
        self.emit(RepositoryEvent::InOutStateChanged);
    }

    #[must_use]
    pub fn create_pull_options(&self) -> PullOptions {
        PullOptions {
            auto_update: self.inner.settings.auto_update,
        }
    }

    // --- Lifecycle ---

    /// Enters `lifecycle`, resetting branch, refs and every group.
    fn set_state(&self, lifecycle: RepositoryState) {
        self.with_state(|s| {
            s.lifecycle = lifecycle;
            s.current_branch = None;
            s.refs.clear();
            s.groups.clear();
        });
        if lifecycle == RepositoryState::Disposed {
            self.inner.shutdown.cancel();
            self.with_state(|s| s.auto_in_out.status = AutoInOutStatus::Disabled);
        }
        info!(state = %lifecycle, root = %self.root().display(), "repository state changed");
        self.emit(RepositoryEvent::StateChanged(lifecycle));
        self.emit(RepositoryEvent::ResourcesChanged);
    }

    /// Disposes the repository and stops the poller.
    pub fn dispose(&self) {
        if self.state() != RepositoryState::Disposed {
            self.set_state(RepositoryState::Disposed);
        }
    }

    fn absorb_gone(&self, err: &SyncError) {
        if err.is_not_a_repository() && self.state() != RepositoryState::Disposed {
            warn!(root = %self.root().display(), "checkout is gone");
            self.set_state(RepositoryState::Disposed);
        }
    }

    // --- run protocol ---

    async fn run<T, F, Fut>(&self, kind: OperationKind, action: F) -> SyncResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        if self.state() == RepositoryState::Disposed {
            debug!(operation = %kind, "rejected: repository disposed");
            return Err(RepositoryError::Disposed.into());
        }

        let _guard = OperationGuard::start(&self.inner, kind);

        match action().await {
            Ok(value) => {
                if !kind.is_read_only()
                    && self.state() != RepositoryState::Disposed
                    && let Err(err) = self.update_model_state().await
                {
                    if !err.is_not_a_repository() {
                        return Err(err);
                    }
                    self.absorb_gone(&err);
                }
                Ok(value)
            }
            Err(err) => {
                self.absorb_gone(&err);
                Err(err)
            }
        }
    }

    async fn update_model_state(&self) -> SyncResult<()> {
        let this = self.clone();
        self.inner
            .throttles
            .model
            .call(move || async move { this.do_update_model_state().await })
            .await
    }

    async fn do_update_model_state(&self) -> SyncResult<()> {
        let fossil = &self.inner.fossil;
        let summary = fossil.get_summary().await?;
        let raw_status = fossil.get_status().await?;
        let raw_extras = fossil.get_extras().await?;
        let current_branch = fossil.get_current_branch().await?;

        let mut statuses = fossil.parse_status_lines(&raw_status);
        statuses.extend(fossil.parse_extras_lines(&raw_extras));

        // Disposed is terminal: a refresh that raced dispose() must not
        // repopulate the model.
        let count = self.with_state(|s| {
            if s.lifecycle == RepositoryState::Disposed {
                return Ok::<_, SyncError>(None);
            }
            group_statuses(&statuses, &mut s.groups)?;
            s.repo_status = Some(summary);
            s.current_branch = current_branch;
            Ok(Some(s.groups.count()))
        })?;
        let Some(count) = count else {
            debug!("refresh discarded: repository disposed");
            return Ok(());
        };

        debug!(count, "model state updated");
        self.emit(RepositoryEvent::StatusChanged);
        Ok(())
    }

    // --- Filesystem changes ---

    /// Feeds one filesystem event into the refresh pipeline.
    ///
    /// Paths outside the root and checkout-database journals are ignored.
    /// Events arriving while operations are in flight are dropped.
    pub fn on_fs_change(&self, path: &Path) {
        let Ok(relative) = path.strip_prefix(self.root()) else {
            return;
        };
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if CHECKOUT_DB_NAMES.iter().any(|db| {
            name.strip_prefix(*db)
                .is_some_and(|rest| CHECKOUT_DB_SUFFIXES.contains(&rest))
        }) {
            return;
        }
        if CHECKOUT_DB_NAMES.contains(&&*name) {
            self.emit(RepositoryEvent::RepositoryChanged(path.to_path_buf()));
        }

        if !self.inner.settings.auto_refresh || !self.operations().is_idle() {
            return;
        }
        self.inner.fs_changes.call(());
    }

    async fn update_when_idle_and_wait(&self) -> SyncResult<()> {
        let this = self.clone();
        self.inner
            .throttles
            .update_when_idle
            .call(move || async move {
                this.when_idle_and_focused().await;
                this.status().await?;
                time::sleep(this.inner.settings.refresh_cooldown).await;
                Ok(())
            })
            .await
    }

    // --- Operations ---

    /// Refreshes the model.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when the refresh fails for a reason other than
    /// the checkout being gone.
    pub async fn status(&self) -> SyncResult<()> {
        let this = self.clone();
        self.inner
            .throttles
            .status
            .call(move || async move { this.run(OperationKind::Status, || async { Ok(()) }).await })
            .await
    }

    fn paths_or_untracked(&self, paths: &[String]) -> Vec<String> {
        self.with_state(|s| {
            if paths.is_empty() {
                s.groups.untracked().paths().map(str::to_owned).collect()
            } else {
                s.groups
                    .map_resources(paths)
                    .iter()
                    .map(|r| r.path().to_owned())
                    .collect()
            }
        })
    }

    /// Starts tracking files; no paths means every untracked file.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when Fossil fails.
    pub async fn add(&self, paths: &[String]) -> SyncResult<()> {
        let this = self.clone();
        let targets = self.paths_or_untracked(paths);
        self.inner
            .throttles
            .add
            .call(move || async move {
                this.run(OperationKind::Add, || async {
                    if !targets.is_empty() {
                        this.inner.fossil.add(&targets).await?;
                    }
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Stops tracking files; no paths means every untracked file.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when Fossil fails.
    pub async fn remove(&self, paths: &[String]) -> SyncResult<()> {
        let this = self.clone();
        let targets = self.paths_or_untracked(paths);
        self.inner
            .throttles
            .remove
            .call(move || async move {
                this.run(OperationKind::Remove, || async {
                    if !targets.is_empty() {
                        this.inner.fossil.remove(&targets).await?;
                    }
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Adds ignore globs; no paths means every untracked file.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when the settings file cannot be written.
    pub async fn ignore(&self, paths: &[String]) -> SyncResult<()> {
        let this = self.clone();
        let targets = self.paths_or_untracked(paths);
        self.inner
            .throttles
            .ignore
            .call(move || async move {
                this.run(OperationKind::Ignore, || async {
                    if !targets.is_empty() {
                        this.inner.fossil.ignore(&targets).await?;
                    }
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Moves resources from working to staging.
    ///
    /// No paths means everything in working. Missing files are forgotten and
    /// untracked files added before the move.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when the add/remove call fails.
    pub async fn stage(&self, paths: &[String]) -> SyncResult<()> {
        let this = self.clone();
        let paths = paths.to_vec();
        self.inner
            .throttles
            .stage
            .call(move || async move {
                this.run(OperationKind::Stage, || async {
                    let resources = if paths.is_empty() {
                        this.group(GroupKind::Working)
                    } else {
                        this.map_resources(&paths)
                    };

                    let missing = paths_with_status(&resources, Status::Missing);
                    if !missing.is_empty() {
                        this.run(OperationKind::Remove, || async {
                            this.inner.fossil.remove(&missing).await?;
                            Ok(())
                        })
                        .await?;
                    }

                    let untracked = paths_with_status(&resources, Status::Untracked);
                    if !untracked.is_empty() {
                        this.run(OperationKind::Add, || async {
                            this.inner.fossil.add(&untracked).await?;
                            Ok(())
                        })
                        .await?;
                    }

                    this.with_state(|s| {
                        if s.lifecycle != RepositoryState::Disposed {
                            s.groups.get_mut(GroupKind::Staging).intersect(&resources);
                            s.groups.get_mut(GroupKind::Working).except(&resources);
                        }
                    });
                    debug!(count = resources.len(), "staged");
                    this.emit(RepositoryEvent::ResourcesChanged);
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Moves resources from staging back to working.
    ///
    /// No paths means everything in staging. Nothing is sent to Fossil.
    ///
    /// # Errors
    ///
    /// Never fails today; the signature matches the other commands.
    pub async fn unstage(&self, paths: &[String]) -> SyncResult<()> {
        let this = self.clone();
        let paths = paths.to_vec();
        self.inner
            .throttles
            .unstage
            .call(move || async move {
                let resources = if paths.is_empty() {
                    this.group(GroupKind::Staging)
                } else {
                    this.map_resources(&paths)
                };
                this.with_state(|s| {
                    s.groups.get_mut(GroupKind::Staging).except(&resources);
                    s.groups.get_mut(GroupKind::Working).intersect(&resources);
                });
                debug!(count = resources.len(), "unstaged");
                this.emit(RepositoryEvent::ResourcesChanged);
                Ok(())
            })
            .await
    }

    /// Commits according to `scope`.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when Fossil rejects the commit.
    pub async fn commit(&self, message: &str, scope: CommitScope) -> SyncResult<()> {
        let this = self.clone();
        let message = message.to_string();
        self.inner
            .throttles
            .commit
            .call(move || async move {
                this.run(OperationKind::Commit, || async {
                    let file_list = match scope {
                        CommitScope::All => Vec::new(),
                        CommitScope::StagedChanges => this.group_paths(GroupKind::Staging),
                        CommitScope::Changes => this.group_paths(GroupKind::Working),
                    };
                    let options = CommitOptions {
                        file_list,
                        user: this.inner.settings.username.clone(),
                    };
                    this.inner.fossil.commit(&message, &options).await?;
                    Ok(())
                })
                .await
            })
            .await
    }

    fn group_paths(&self, kind: GroupKind) -> Vec<String> {
        self.with_state(|s| s.groups.get(kind).paths().map(str::to_owned).collect())
    }

    /// Reverts tracked changes; untracked and ignored files are skipped.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when Fossil fails.
    pub async fn revert(&self, paths: &[String]) -> SyncResult<()> {
        let this = self.clone();
        let targets: Vec<String> = self
            .map_resources(paths)
            .iter()
            .filter(|r| !matches!(r.status(), Status::Untracked | Status::Ignored))
            .map(|r| r.path().to_owned())
            .collect();
        self.inner
            .throttles
            .revert
            .call(move || async move {
                this.run(OperationKind::Revert, || async {
                    if !targets.is_empty() {
                        this.inner.fossil.revert(&targets).await?;
                    }
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Deletes untracked files.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when Fossil fails.
    pub async fn clean(&self) -> SyncResult<()> {
        let this = self.clone();
        self.inner
            .throttles
            .clean
            .call(move || async move {
                this.run(OperationKind::Clean, || async {
                    this.inner.fossil.clean().await?;
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Creates a branch at the current checkout.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when the branch exists.
    pub async fn branch(&self, name: &str) -> SyncResult<()> {
        let this = self.clone();
        let name = name.to_string();
        self.inner
            .throttles
            .branch
            .call(move || async move {
                this.run(OperationKind::Branch, || async {
                    this.inner.fossil.branch(&name).await?;
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Updates the checkout to `treeish` (empty means tip of the branch).
    ///
    /// # Errors
    ///
    /// Fails when disposed or when Fossil fails.
    pub async fn update(&self, treeish: &str, options: UpdateOptions) -> SyncResult<()> {
        let this = self.clone();
        let treeish = treeish.to_string();
        self.inner
            .throttles
            .update
            .call(move || async move {
                this.run(OperationKind::Update, || async {
                    this.inner.fossil.update(&treeish, options).await?;
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Closes the checkout. Returns `false` when unsaved changes prevented it.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when Fossil fails otherwise.
    pub async fn close(&self) -> SyncResult<bool> {
        let this = self.clone();
        self.inner
            .throttles
            .close
            .call(move || async move {
                let refused = this
                    .run(OperationKind::Close, || async {
                        Ok(this.inner.fossil.close().await?)
                    })
                    .await?;
                match refused {
                    Some(message) => {
                        this.inner.interaction.warn_unsaved_changes(&message);
                        Ok(false)
                    }
                    None => Ok(true),
                }
            })
            .await
    }

    /// Undoes the last undoable command, or only reports it when `dry_run`.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when Fossil fails.
    pub async fn undo(&self, dry_run: bool) -> SyncResult<UndoDetails> {
        let this = self.clone();
        let kind = if dry_run {
            OperationKind::UndoDryRun
        } else {
            OperationKind::Undo
        };
        self.inner
            .throttles
            .undo
            .call(move || async move {
                debug!(dry_run, "undo");
                this.run(kind, || async { Ok(this.inner.fossil.undo(dry_run).await?) })
                    .await
            })
            .await
    }

    /// Pulls from the default remote.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when the sync fails.
    pub async fn pull(&self, options: PullOptions) -> SyncResult<()> {
        let this = self.clone();
        self.inner
            .throttles
            .pull
            .call(move || async move {
                this.run(OperationKind::Pull, || async {
                    this.inner.fossil.pull(options).await?;
                    Ok(())
                })
                .await
            })
            .await
    }

    /// Pushes to the default remote.
    ///
    /// A push that would fork the remote is not an error: the interaction
    /// layer is asked what to do and, on [`PushCreatesNewHeadAction::Pull`],
    /// a pull with [`Self::create_pull_options`] follows.
    ///
    /// # Errors
    ///
    /// Fails when disposed, on any other push failure, or when the follow-up
    /// pull fails.
    pub async fn push(&self) -> SyncResult<PushOutcome> {
        let this = self.clone();
        self.inner
            .throttles
            .push
            .call(move || async move {
                let outcome = this
                    .run(OperationKind::Push, || async {
                        match this.inner.fossil.push().await {
                            Ok(()) => Ok(PushOutcome::Pushed),
                            Err(err)
                                if err.code() == Some(FossilErrorCode::PushCreatesNewRemoteHead) =>
                            {
                                info!("push would create a new remote head");
                                let action = this.inner.interaction.warn_push_creates_new_head().await;
                                Ok(PushOutcome::NewRemoteHead(action))
                            }
                            Err(err) => Err(err.into()),
                        }
                    })
                    .await?;

                if outcome == PushOutcome::NewRemoteHead(PushCreatesNewHeadAction::Pull) {
                    this.pull(this.create_pull_options()).await?;
                }
                Ok(outcome)
            })
            .await
    }

    /// Merges `rev` into the checkout.
    ///
    /// On an untracked-file collision the reported names are rewritten with
    /// platform separators before the error is returned.
    ///
    /// # Errors
    ///
    /// Fails when disposed or when the merge fails.
    pub async fn merge(&self, rev: &str) -> SyncResult<MergeResult> {
        let this = self.clone();
        let rev = rev.to_string();
        self.inner
            .throttles
            .merge
            .call(move || async move {
                this.run(OperationKind::Merge, || async {
                    this.inner.fossil.merge(&rev).await.map_err(|mut err| {
                        if err.code() == Some(FossilErrorCode::UntrackedFilesDiffer) {
                            let names = err
                                .filenames()
                                .iter()
                                .map(|name| to_workspace_relative(name))
                                .collect();
                            err.set_filenames(names);
                        }
                        SyncError::from(err)
                    })
                })
                .await
            })
            .await
    }

    /// Contents of `path` at `checkin`, once the repository is idle and focused.
    ///
    /// A file missing at that revision yields an empty string.
    ///
    /// # Errors
    ///
    /// Fails when disposed, or with [`RepositoryError::CouldNotShow`] when
    /// Fossil exits non-zero.
    pub async fn show(&self, path: &Path, checkin: &str) -> SyncResult<String> {
        self.when_idle_and_focused().await;

        let relative = self.to_repo_relative(path);
        self.run(OperationKind::Show, || async {
            debug!(path = %relative, checkin, "show");
            match self.inner.fossil.cat(&relative, checkin).await {
                Ok(content) => Ok(content),
                Err(err) if err.code() == Some(FossilErrorCode::NoSuchFile) => Ok(String::new()),
                Err(err) => match err.exit_code() {
                    Some(0) => Err(err.into()),
                    code => Err(RepositoryError::CouldNotShow {
                        exit_code: code.unwrap_or(-1),
                    }
                    .into()),
                },
            }
        })
        .await
    }

    /// Absolute or root-relative path to a `/`-separated relative path.
    #[must_use]
    pub fn to_repo_relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(self.root()).unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }

    // --- Queries ---

    /// Reloads the default remote; failures yield an empty path.
    pub async fn get_path(&self) -> RemotePath {
        let this = self.clone();
        let result = self
            .inner
            .throttles
            .get_path
            .call(move || async move { Ok(this.inner.fossil.get_paths().await?) })
            .await;
        match result {
            Ok(path) => {
                self.with_state(|s| s.path = path.clone());
                path
            }
            Err(err) => {
                debug!(error = %err, "no remote path");
                RemotePath::default()
            }
        }
    }

    /// Branches followed by tags.
    ///
    /// # Errors
    ///
    /// Fails when either listing fails.
    pub async fn get_refs(&self) -> SyncResult<Vec<Ref>> {
        let this = self.clone();
        let refs = self
            .inner
            .throttles
            .get_refs
            .call(move || async move {
                let (branches, tags) = futures_util::future::try_join(
                    this.inner.fossil.get_branches(),
                    this.inner.fossil.get_tags(),
                )
                .await?;
                Ok(branches.into_iter().chain(tags).collect::<Vec<_>>())
            })
            .await?;
        self.with_state(|s| s.refs.clone_from(&refs));
        Ok(refs)
    }

    /// # Errors
    ///
    /// Fails when Fossil fails.
    pub async fn get_parents(&self) -> SyncResult<String> {
        let this = self.clone();
        self.inner
            .throttles
            .get_parents
            .call(move || async move { Ok(this.inner.fossil.get_parents().await?) })
            .await
    }

    /// # Errors
    ///
    /// Fails when Fossil fails.
    pub async fn get_branches(&self) -> SyncResult<Vec<Ref>> {
        let this = self.clone();
        self.inner
            .throttles
            .get_branches
            .call(move || async move { Ok(this.inner.fossil.get_branches().await?) })
            .await
    }

    /// Timeline entries, newest first.
    ///
    /// # Errors
    ///
    /// Fails when Fossil fails.
    pub async fn get_log_entries(&self, options: LogOptions) -> SyncResult<Vec<Commit>> {
        let this = self.clone();
        let query = LogEntryOptions {
            rev_query: options.rev_query.unwrap_or_default(),
            file_path: options.file.as_deref().map(|file| self.to_repo_relative(file)),
            limit: options.limit.unwrap_or(DEFAULT_LOG_LIMIT),
        };
        self.inner
            .throttles
            .get_log_entries
            .call(move || async move { Ok(this.inner.fossil.get_log_entries(&query).await?) })
            .await
    }

    /// One commit with its parent and the current file statuses.
    ///
    /// # Errors
    ///
    /// Fails when Fossil fails or `revision` is unknown.
    pub async fn get_commit_details(&self, revision: &str) -> SyncResult<CommitDetails> {
        let this = self.clone();
        let revision = revision.to_string();
        self.inner
            .throttles
            .get_commit_details
            .call(move || async move {
                let commits = this
                    .get_log_entries(LogOptions {
                        rev_query: Some(revision.clone()),
                        file: None,
                        limit: Some(1),
                    })
                    .await?;
                let raw_status = this.inner.fossil.get_status().await?;
                let parent = this.get_parents().await?;
                let commit = commits.into_iter().next().ok_or_else(|| {
                    SyncError::other(format!("no commit found for '{revision}'"))
                })?;
                Ok(CommitDetails {
                    commit,
                    parent,
                    files: this.inner.fossil.parse_status_lines(&raw_status),
                })
            })
            .await
    }

    pub(crate) async fn probe_throttled<F, Fut>(&self, make: F) -> SyncResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SyncResult<()>> + Send + 'static,
    {
        self.inner.throttles.probe.call(make).await
    }
}

fn paths_with_status(resources: &[FileResource], status: Status) -> Vec<String> {
    resources
        .iter()
        .filter(|r| r.status() == status)
        .map(|r| r.path().to_owned())
        .collect()
}

fn to_workspace_relative(repo_relative: &str) -> String {
    repo_relative
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(MAIN_SEPARATOR_STR)
}
