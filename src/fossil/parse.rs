// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Parsers for Fossil command output.
//!
//! ```text
//! status   KEYWORD path          -> FileStatus
//!          key: value (header)   -> RepoStatus
//! extras   path                  -> FileStatus (Untracked)
//! sync     Artifacts sent: N  received: M  -> Divergence
//! timeline hash|author|date|branch|comment -> Commit
//! ```

use std::sync::OnceLock;

use regex::Regex;

use super::{Commit, Divergence, MergeResult, Ref, RemotePath, RepoStatus};
use crate::resource::{FileStatus, MergeStatus, Status};

/// Field separator of the timeline format passed by [`super::FossilCli`].
pub const TIMELINE_SEPARATOR: char = '|';

const MERGE_MARKERS: &[&str] = &["MERGED_WITH", "CHERRYPICK", "BACKOUT", "INTEGRATE"];

fn keyword_status(keyword: &str) -> Option<(Status, MergeStatus)> {
    let mapped = match keyword {
        "EDITED" | "EXECUTABLE" | "SYMLINK" | "UNEXEC" | "UNLINK" => {
            (Status::Modified, MergeStatus::None)
        }
        "ADDED" => (Status::Added, MergeStatus::None),
        "DELETED" => (Status::Deleted, MergeStatus::None),
        "MISSING" => (Status::Missing, MergeStatus::None),
        "RENAMED" => (Status::Renamed, MergeStatus::None),
        "UNCHANGED" => (Status::Unmodified, MergeStatus::None),
        "CONFLICT" => (Status::Modified, MergeStatus::Unresolved),
        "UPDATED_BY_MERGE" | "UPDATED_BY_INTEGRATE" => (Status::Modified, MergeStatus::Resolved),
        "ADDED_BY_MERGE" | "ADDED_BY_INTEGRATE" => (Status::Added, MergeStatus::Resolved),
        "EXTRA" => (Status::Untracked, MergeStatus::None),
        _ => return None,
    };
    Some(mapped)
}

/// Parses `fossil status` / `fossil changes` output into file records.
#[must_use]
pub fn parse_status_lines(raw: &str) -> Vec<FileStatus> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim_end();
            let (keyword, rest) = line.split_once(char::is_whitespace)?;
            let (status, merge_status) = keyword_status(keyword)?;
            let rest = rest.trim();
            if rest.is_empty() {
                return None;
            }

            let record = match rest.split_once(" -> ") {
                Some((source, target)) if status == Status::Renamed => {
                    FileStatus::new(status, target.trim()).with_rename_source(source.trim())
                }
                _ => FileStatus::new(status, rest),
            };
            Some(record.with_merge_status(merge_status))
        })
        .collect()
}

/// Parses `fossil extras` output: every non-blank line is untracked.
#[must_use]
pub fn parse_extras_lines(raw: &str) -> Vec<FileStatus> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| FileStatus::new(Status::Untracked, line))
        .collect()
}

/// Parses the header of `fossil status`.
#[must_use]
pub fn parse_summary(raw: &str) -> RepoStatus {
    let mut summary = RepoStatus::default();
    for line in raw.lines() {
        if MERGE_MARKERS
            .iter()
            .any(|marker| line.starts_with(marker))
        {
            summary.is_merge = true;
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "checkout" => summary.checkout = first_word(value),
            "parent" => summary.parent = first_word(value),
            "tags" => {
                summary.tags = value
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_owned)
                    .collect();
            }
            _ => {}
        }
    }
    summary
}

/// Extracts the parent hash from `fossil info` output; empty when absent.
#[must_use]
pub fn parse_parent(raw: &str) -> String {
    raw.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "parent")
        .and_then(|(_, value)| first_word(value.trim()))
        .unwrap_or_default()
}

/// Parses `fossil branch ls`; the current branch is marked with `*`.
#[must_use]
pub fn parse_branch_lines(raw: &str) -> Vec<Ref> {
    raw.lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|name| !name.is_empty())
        .map(Ref::branch)
        .collect()
}

/// Parses `fossil tag list`.
#[must_use]
pub fn parse_tag_lines(raw: &str) -> Vec<Ref> {
    raw.lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(Ref::tag)
        .collect()
}

/// Parses `fossil remote` output; `off` means no remote.
#[must_use]
pub fn parse_remote(raw: &str) -> RemotePath {
    let url = raw.trim();
    if url.is_empty() || url == "off" {
        return RemotePath::default();
    }
    RemotePath {
        name: "default".to_string(),
        url: url.to_string(),
    }
}

fn sync_counts_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Artifacts sent:\s*(\d+)\s+received:\s*(\d+)").ok())
        .as_ref()
}

/// Reads the last `Artifacts sent: N received: M` line of a sync run.
///
/// Sent artifacts count as outgoing, received ones as incoming.
#[must_use]
pub fn parse_sync_counts(raw: &str) -> Divergence {
    let Some(regex) = sync_counts_regex() else {
        return Divergence::default();
    };
    regex
        .captures_iter(raw)
        .last()
        .map(|caps| Divergence {
            outgoing: caps[1].parse().unwrap_or(0),
            incoming: caps[2].parse().unwrap_or(0),
        })
        .unwrap_or_default()
}

fn merge_conflicts_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s+merge conflicts?").ok())
        .as_ref()
}

/// Reads the conflict count reported by `fossil merge`.
#[must_use]
pub fn parse_merge_result(raw: &str) -> MergeResult {
    let unresolved_count = merge_conflicts_regex()
        .and_then(|regex| regex.captures(raw))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0);
    MergeResult { unresolved_count }
}

/// Parses timeline lines written with [`TIMELINE_SEPARATOR`].
///
/// Lines without all five fields (e.g. the entry-limit trailer) are skipped.
#[must_use]
pub fn parse_timeline(raw: &str) -> Vec<Commit> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(5, TIMELINE_SEPARATOR);
            let hash = fields.next()?.trim();
            let author = fields.next()?.trim();
            let date = fields.next()?.trim();
            let branch = fields.next()?.trim();
            let message = fields.next()?.trim();
            if hash.is_empty() {
                return None;
            }
            Some(Commit {
                hash: hash.to_string(),
                author: author.to_string(),
                date: date.to_string(),
                branch: (!branch.is_empty()).then(|| branch.to_string()),
                message: message.to_string(),
            })
        })
        .collect()
}

fn first_word(value: &str) -> Option<String> {
    value.split_whitespace().next().map(str::to_owned)
}
