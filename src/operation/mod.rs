// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Operation tracking.
//!
//! ```text
//! OperationKind (closed enum, one bit each)
//!        |
//!        v
//! OperationSet  --start(kind)-->  OperationSet'   (new value, bit set)
//!               --end(kind)--->   OperationSet''  (new value, bit cleared)
//!
//! is_idle()  <=>  no bit set
//! ```
//!
//! An [`OperationSet`] is a plain `Copy` value. Transitions never mutate in
//! place and never fail, so interleaved tasks can only ever publish a whole
//! new set. Kinds do not exclude each other here; serialising calls to the
//! same method is the job of [`crate::coalesce`].

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Raw bit layout backing [`OperationSet`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    struct OperationBits: u32 {
        const STATUS = 1 << 0;
        const ADD = 1 << 1;
        const REVERT_FILES = 1 << 2;
        const COMMIT = 1 << 3;
        const CLEAN = 1 << 4;
        const BRANCH = 1 << 5;
        const UPDATE = 1 << 6;
        const UNDO = 1 << 7;
        const UNDO_DRY_RUN = 1 << 8;
        const PULL = 1 << 9;
        const PUSH = 1 << 10;
        const SYNC = 1 << 11;
        const INIT = 1 << 12;
        const SHOW = 1 << 13;
        const STAGE = 1 << 14;
        const GET_COMMIT_TEMPLATE = 1 << 15;
        const REVERT = 1 << 16;
        const RESOLVE = 1 << 17;
        const UNRESOLVE = 1 << 18;
        const PARENTS = 1 << 19;
        const REMOVE = 1 << 20;
        const MERGE = 1 << 21;
        const CLOSE = 1 << 25;
        const IGNORE = 1 << 26;
    }
}

/// Category of repository-mutating or -inspecting action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Status,
    Add,
    RevertFiles,
    Commit,
    Clean,
    Branch,
    Update,
    Undo,
    UndoDryRun,
    Pull,
    Push,
    Sync,
    Init,
    Show,
    Stage,
    GetCommitTemplate,
    Revert,
    Resolve,
    Unresolve,
    Parents,
    Remove,
    Merge,
    Close,
    Ignore,
}

impl OperationKind {
    /// Every kind, in bit order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Status,
            Self::Add,
            Self::RevertFiles,
            Self::Commit,
            Self::Clean,
            Self::Branch,
            Self::Update,
            Self::Undo,
            Self::UndoDryRun,
            Self::Pull,
            Self::Push,
            Self::Sync,
            Self::Init,
            Self::Show,
            Self::Stage,
            Self::GetCommitTemplate,
            Self::Revert,
            Self::Resolve,
            Self::Unresolve,
            Self::Parents,
            Self::Remove,
            Self::Merge,
            Self::Close,
            Self::Ignore,
        ]
    }

    const fn bits(self) -> OperationBits {
        match self {
            Self::Status => OperationBits::STATUS,
            Self::Add => OperationBits::ADD,
            Self::RevertFiles => OperationBits::REVERT_FILES,
            Self::Commit => OperationBits::COMMIT,
            Self::Clean => OperationBits::CLEAN,
            Self::Branch => OperationBits::BRANCH,
            Self::Update => OperationBits::UPDATE,
            Self::Undo => OperationBits::UNDO,
            Self::UndoDryRun => OperationBits::UNDO_DRY_RUN,
            Self::Pull => OperationBits::PULL,
            Self::Push => OperationBits::PUSH,
            Self::Sync => OperationBits::SYNC,
            Self::Init => OperationBits::INIT,
            Self::Show => OperationBits::SHOW,
            Self::Stage => OperationBits::STAGE,
            Self::GetCommitTemplate => OperationBits::GET_COMMIT_TEMPLATE,
            Self::Revert => OperationBits::REVERT,
            Self::Resolve => OperationBits::RESOLVE,
            Self::Unresolve => OperationBits::UNRESOLVE,
            Self::Parents => OperationBits::PARENTS,
            Self::Remove => OperationBits::REMOVE,
            Self::Merge => OperationBits::MERGE,
            Self::Close => OperationBits::CLOSE,
            Self::Ignore => OperationBits::IGNORE,
        }
    }

    /// Read-only kinds skip the post-operation state refresh.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Show | Self::GetCommitTemplate)
    }

    /// Display name used in logs and events.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Add => "add",
            Self::RevertFiles => "revert_files",
            Self::Commit => "commit",
            Self::Clean => "clean",
            Self::Branch => "branch",
            Self::Update => "update",
            Self::Undo => "undo",
            Self::UndoDryRun => "undo_dry_run",
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Sync => "sync",
            Self::Init => "init",
            Self::Show => "show",
            Self::Stage => "stage",
            Self::GetCommitTemplate => "get_commit_template",
            Self::Revert => "revert",
            Self::Resolve => "resolve",
            Self::Unresolve => "unresolve",
            Self::Parents => "parents",
            Self::Remove => "remove",
            Self::Merge => "merge",
            Self::Close => "close",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable set of operation kinds currently in flight.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OperationSet(OperationBits);

impl OperationSet {
    /// The empty (idle) set.
    #[must_use]
    pub const fn new() -> Self {
        Self(OperationBits::empty())
    }

    /// Returns a new set with `kind` marked as running.
    #[must_use]
    pub const fn start(self, kind: OperationKind) -> Self {
        Self(self.0.union(kind.bits()))
    }

    /// Returns a new set with `kind` cleared.
    #[must_use]
    pub const fn end(self, kind: OperationKind) -> Self {
        Self(self.0.difference(kind.bits()))
    }

    #[must_use]
    pub const fn is_running(self, kind: OperationKind) -> bool {
        self.0.contains(kind.bits())
    }

    #[must_use]
    pub const fn is_idle(self) -> bool {
        self.0.is_empty()
    }

    /// Kinds currently running, in bit order.
    pub fn running(self) -> impl Iterator<Item = OperationKind> {
        OperationKind::all()
            .iter()
            .copied()
            .filter(move |kind| self.is_running(*kind))
    }
}

impl fmt::Debug for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.running()).finish()
    }
}

#[cfg(test)]
mod tests;
