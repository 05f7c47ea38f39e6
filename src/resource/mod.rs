// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resource model: tracked files and the groups they are shown in.
//!
//! ```text
//! FileStatus (raw, from the tool)
//!        |
//!        v  group_statuses()
//! +------------------------------------------------------+
//! | StatusGroups                                         |
//! |   working   staging   (a path is in at most one)     |
//! |   merge     conflict  (overlays)                     |
//! |   untracked                                          |
//! +------------------------------------------------------+
//!        |
//!        v
//! FileResource { path, status, merge_status, rename }
//! ```
//!
//! Paths are repository-relative with `/` separators.

pub mod group;

use std::fmt;

use crate::error::ResourceError;

pub use group::{GroupKind, ResourceGroup, StatusGroups, group_statuses};

/// Working-copy status of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Modified,
    Added,
    Deleted,
    Untracked,
    Ignored,
    Missing,
    Renamed,
    Unmodified,
    Conflict,
}

impl Status {
    /// Dirty statuses count as local changes.
    #[must_use]
    pub const fn is_dirty(self) -> bool {
        !matches!(self, Self::Untracked | Self::Ignored)
    }

    /// Whether a rename target may accompany this status.
    #[must_use]
    pub const fn allows_rename(self) -> bool {
        matches!(
            self,
            Self::Added | Self::Modified | Self::Renamed | Self::Conflict
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modified => "modified",
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Untracked => "untracked",
            Self::Ignored => "ignored",
            Self::Missing => "missing",
            Self::Renamed => "renamed",
            Self::Unmodified => "unmodified",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge state of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeStatus {
    #[default]
    None,
    Unresolved,
    Resolved,
}

/// Raw status record as reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub status: Status,
    pub path: String,
    /// Previous path when the file was renamed.
    pub rename_source: Option<String>,
    pub merge_status: MergeStatus,
}

impl FileStatus {
    pub fn new(status: Status, path: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
            rename_source: None,
            merge_status: MergeStatus::None,
        }
    }

    #[must_use]
    pub fn with_rename_source(mut self, source: impl Into<String>) -> Self {
        self.rename_source = Some(source.into());
        self
    }

    #[must_use]
    pub const fn with_merge_status(mut self, merge_status: MergeStatus) -> Self {
        self.merge_status = merge_status;
        self
    }
}

/// One tracked path as shown in a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    path: String,
    status: Status,
    merge_status: MergeStatus,
    rename: Option<String>,
}

impl FileResource {
    /// Resource without a rename target.
    pub fn new(path: impl Into<String>, status: Status, merge_status: MergeStatus) -> Self {
        Self {
            path: path.into(),
            status,
            merge_status,
            rename: None,
        }
    }

    /// Builds a resource, validating the rename target.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnexpectedRenameStatus`] when `rename` is set
    /// on a status that cannot carry one.
    pub fn try_new(
        path: impl Into<String>,
        status: Status,
        merge_status: MergeStatus,
        rename: Option<String>,
    ) -> Result<Self, ResourceError> {
        let path = path.into();
        if rename.is_some() && !status.allows_rename() {
            return Err(ResourceError::UnexpectedRenameStatus {
                path,
                status: status.to_string(),
            });
        }
        Ok(Self {
            path,
            status,
            merge_status,
            rename,
        })
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub const fn merge_status(&self) -> MergeStatus {
        self.merge_status
    }

    #[must_use]
    pub fn rename(&self) -> Option<&str> {
        self.rename.as_deref()
    }

    #[must_use]
    pub const fn is_dirty_status(&self) -> bool {
        self.status.is_dirty()
    }
}
