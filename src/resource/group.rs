// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resource groups and the status grouping algorithm.

use std::collections::HashSet;
use std::fmt;

use super::{FileResource, FileStatus, MergeStatus, Status};
use crate::error::ResourceError;

/// Role of a resource group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Working,
    Staging,
    Merge,
    Conflict,
    Untracked,
}

impl GroupKind {
    /// Order used to resolve a path present in several groups.
    pub const LOOKUP_ORDER: [Self; 5] = [
        Self::Working,
        Self::Staging,
        Self::Merge,
        Self::Untracked,
        Self::Conflict,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Staging => "staging",
            Self::Merge => "merge",
            Self::Conflict => "conflict",
            Self::Untracked => "untracked",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Working => "Changes",
            Self::Staging => "Staged Changes",
            Self::Merge => "Merge Changes",
            Self::Conflict => "Unresolved Conflicts",
            Self::Untracked => "Untracked Files",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Ordered collection of resources, unique by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    kind: GroupKind,
    resources: Vec<FileResource>,
}

impl ResourceGroup {
    #[must_use]
    pub const fn new(kind: GroupKind) -> Self {
        Self {
            kind,
            resources: Vec::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> GroupKind {
        self.kind
    }

    #[must_use]
    pub fn resources(&self) -> &[FileResource] {
        &self.resources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FileResource> {
        self.resources.iter().find(|r| r.path() == path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(FileResource::path)
    }

    /// Replaces the whole content. Later duplicates of a path are dropped.
    pub fn update_resources(&mut self, resources: Vec<FileResource>) {
        let mut seen = HashSet::with_capacity(resources.len());
        self.resources = resources
            .into_iter()
            .filter(|r| seen.insert(r.path().to_owned()))
            .collect();
    }

    /// Adds the given resources, keeping existing entries for known paths.
    pub fn intersect(&mut self, resources: &[FileResource]) {
        for resource in resources {
            if !self.contains(resource.path()) {
                self.resources.push(resource.clone());
            }
        }
    }

    /// Drops every resource whose path is among `resources`.
    pub fn except(&mut self, resources: &[FileResource]) {
        let drop: HashSet<&str> = resources.iter().map(FileResource::path).collect();
        self.resources.retain(|r| !drop.contains(r.path()));
    }
}

/// The five groups of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusGroups {
    working: ResourceGroup,
    staging: ResourceGroup,
    merge: ResourceGroup,
    conflict: ResourceGroup,
    untracked: ResourceGroup,
}

impl Default for StatusGroups {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusGroups {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            working: ResourceGroup::new(GroupKind::Working),
            staging: ResourceGroup::new(GroupKind::Staging),
            merge: ResourceGroup::new(GroupKind::Merge),
            conflict: ResourceGroup::new(GroupKind::Conflict),
            untracked: ResourceGroup::new(GroupKind::Untracked),
        }
    }

    #[must_use]
    pub const fn get(&self, kind: GroupKind) -> &ResourceGroup {
        match kind {
            GroupKind::Working => &self.working,
            GroupKind::Staging => &self.staging,
            GroupKind::Merge => &self.merge,
            GroupKind::Conflict => &self.conflict,
            GroupKind::Untracked => &self.untracked,
        }
    }

    pub(crate) const fn get_mut(&mut self, kind: GroupKind) -> &mut ResourceGroup {
        match kind {
            GroupKind::Working => &mut self.working,
            GroupKind::Staging => &mut self.staging,
            GroupKind::Merge => &mut self.merge,
            GroupKind::Conflict => &mut self.conflict,
            GroupKind::Untracked => &mut self.untracked,
        }
    }

    #[must_use]
    pub const fn working(&self) -> &ResourceGroup {
        &self.working
    }

    #[must_use]
    pub const fn staging(&self) -> &ResourceGroup {
        &self.staging
    }

    #[must_use]
    pub const fn merge(&self) -> &ResourceGroup {
        &self.merge
    }

    #[must_use]
    pub const fn conflict(&self) -> &ResourceGroup {
        &self.conflict
    }

    #[must_use]
    pub const fn untracked(&self) -> &ResourceGroup {
        &self.untracked
    }

    /// First match for `path` in [`GroupKind::LOOKUP_ORDER`].
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&FileResource> {
        GroupKind::LOOKUP_ORDER
            .iter()
            .find_map(|kind| self.get(*kind).get(path))
    }

    /// Resolves paths to resources; unknown paths are skipped.
    #[must_use]
    pub fn map_resources<S: AsRef<str>>(&self, paths: &[S]) -> Vec<FileResource> {
        paths
            .iter()
            .filter_map(|path| self.find(path.as_ref()))
            .cloned()
            .collect()
    }

    /// Total entries across all groups; overlays count separately.
    #[must_use]
    pub fn count(&self) -> usize {
        GroupKind::LOOKUP_ORDER
            .iter()
            .map(|kind| self.get(*kind).len())
            .sum()
    }

    /// No pending changes: untracked files do not count.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        [&self.working, &self.merge, &self.conflict, &self.staging]
            .iter()
            .all(|group| group.is_empty())
    }

    /// True when `path` has a change in any group except untracked.
    #[must_use]
    pub fn is_in_any_group(&self, path: &str) -> bool {
        [&self.working, &self.staging, &self.merge, &self.conflict]
            .iter()
            .any(|group| group.contains(path))
    }

    pub fn clear(&mut self) {
        for kind in GroupKind::LOOKUP_ORDER {
            self.get_mut(kind).update_resources(Vec::new());
        }
    }
}

/// Rebuilds all groups from raw statuses.
///
/// Staging keeps only paths that were staged before and are still reported
/// as changed; everything else is derived from `statuses`. Unmodified files
/// are not shown unless they carry a merge state. Input order is kept within
/// each group.
///
/// # Errors
///
/// Returns [`ResourceError::UnexpectedRenameStatus`] for a rename source on a
/// status that cannot carry one. Groups are left untouched in that case.
pub fn group_statuses(
    statuses: &[FileStatus],
    groups: &mut StatusGroups,
) -> Result<(), ResourceError> {
    let staged: HashSet<String> = groups.staging.paths().map(str::to_owned).collect();

    let mut working = Vec::new();
    let mut staging = Vec::new();
    let mut merge = Vec::new();
    let mut conflict = Vec::new();
    let mut untracked = Vec::new();

    for raw in statuses {
        let resource = FileResource::try_new(
            raw.path.clone(),
            raw.status,
            raw.merge_status,
            raw.rename_source.clone(),
        )?;

        if matches!(raw.status, Status::Untracked | Status::Ignored) {
            untracked.push(resource);
            continue;
        }

        match raw.merge_status {
            MergeStatus::Unresolved if !matches!(raw.status, Status::Missing | Status::Deleted) => {
                conflict.push(resource.clone());
            }
            MergeStatus::Resolved => merge.push(resource.clone()),
            _ => {}
        }

        if raw.status == Status::Unmodified {
            continue;
        }

        if staged.contains(&raw.path) {
            staging.push(resource);
        } else {
            working.push(resource);
        }
    }

    groups.working.update_resources(working);
    groups.staging.update_resources(staging);
    groups.merge.update_resources(merge);
    groups.conflict.update_resources(conflict);
    groups.untracked.update_resources(untracked);
    Ok(())
}
