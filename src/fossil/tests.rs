// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::cli::{classify_stderr, untracked_filenames};
use super::parse::{
    parse_branch_lines, parse_extras_lines, parse_merge_result, parse_parent, parse_remote,
    parse_status_lines, parse_summary, parse_sync_counts, parse_timeline,
};
use super::test_utils::ScriptedFossil;
use super::{Divergence, FossilCli, FossilRepository, RemotePath};
use crate::error::{FossilError, FossilErrorCode};
use crate::resource::{FileStatus, MergeStatus, Status};

const STATUS_OUTPUT: &str = "\
repository:   /home/dev/project.fossil
local-root:   /home/dev/project/
checkout:     4f1c2a9e0b7d 2026-03-01 10:11:12 UTC
parent:       a0b1c2d3e4f5 2026-02-28 09:00:00 UTC
tags:         trunk, release
comment:      Tidy up
EDITED     src/main.rs
ADDED      docs/new.md
DELETED    old.txt
MISSING    gone.txt
RENAMED    lib/a.rs -> lib/b.rs
CONFLICT   clash.c
UPDATED_BY_MERGE merged.c
ADDED_BY_INTEGRATE extra.c
EXECUTABLE run.sh
MERGED_WITH 77aa55cc
";

#[test]
fn test_parse_status_lines_maps_keywords() {
    let parsed = parse_status_lines(STATUS_OUTPUT);
    assert_eq!(
        parsed,
        vec![
            FileStatus::new(Status::Modified, "src/main.rs"),
            FileStatus::new(Status::Added, "docs/new.md"),
            FileStatus::new(Status::Deleted, "old.txt"),
            FileStatus::new(Status::Missing, "gone.txt"),
            FileStatus::new(Status::Renamed, "lib/b.rs").with_rename_source("lib/a.rs"),
            FileStatus::new(Status::Modified, "clash.c").with_merge_status(MergeStatus::Unresolved),
            FileStatus::new(Status::Modified, "merged.c").with_merge_status(MergeStatus::Resolved),
            FileStatus::new(Status::Added, "extra.c").with_merge_status(MergeStatus::Resolved),
            FileStatus::new(Status::Modified, "run.sh"),
        ]
    );
}

#[test]
fn test_parse_status_keeps_spaces_in_paths() {
    let parsed = parse_status_lines("EDITED     my notes/todo list.txt\n");
    assert_eq!(parsed[0].path, "my notes/todo list.txt");
}

#[test]
fn test_parse_extras_lines() {
    let parsed = parse_extras_lines("a.tmp\n\n  build/out.o  \n");
    assert_eq!(
        parsed,
        vec![
            FileStatus::new(Status::Untracked, "a.tmp"),
            FileStatus::new(Status::Untracked, "build/out.o"),
        ]
    );
}

#[test]
fn test_parse_summary_reads_header() {
    let summary = parse_summary(STATUS_OUTPUT);
    assert_eq!(summary.checkout.as_deref(), Some("4f1c2a9e0b7d"));
    assert_eq!(summary.parent.as_deref(), Some("a0b1c2d3e4f5"));
    assert_eq!(summary.tags, vec!["trunk", "release"]);
    assert!(summary.is_merge);

    assert!(!parse_summary("checkout: abc 2026-01-01\n").is_merge);
}

#[test]
fn test_parse_parent_and_remote() {
    assert_eq!(parse_parent(STATUS_OUTPUT), "a0b1c2d3e4f5");
    assert_eq!(parse_parent("project-name: x\n"), "");

    assert_eq!(parse_remote("off\n"), RemotePath::default());
    let remote = parse_remote("https://fossil.example.com/repo\n");
    assert_eq!(remote.name, "default");
    assert_eq!(remote.url, "https://fossil.example.com/repo");
}

#[test]
fn test_parse_branch_lines_strips_current_marker() {
    let names: Vec<_> = parse_branch_lines("   feature\n * trunk\n\n")
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["feature", "trunk"]);
}

#[test]
fn test_parse_sync_counts_uses_last_round_trip() {
    let raw = "\
Sync with https://fossil.example.com/repo
Round-trips: 1   Artifacts sent: 0  received: 0
Round-trips: 2   Artifacts sent: 3  received: 5
Sync done, wire bytes sent: 1234  received: 5678
";
    assert_eq!(
        parse_sync_counts(raw),
        Divergence {
            incoming: 5,
            outgoing: 3
        }
    );
    assert_eq!(parse_sync_counts("nothing here"), Divergence::default());
}

#[test]
fn test_parse_merge_result() {
    assert_eq!(
        parse_merge_result("MERGE a.c\n***** 2 merge conflicts in a.c\nWARNING: 2 merge conflicts")
            .unresolved_count,
        2
    );
    assert_eq!(parse_merge_result("UPDATE b.c\n").unresolved_count, 0);
}

#[test]
fn test_parse_timeline_skips_trailer() {
    let raw = "\
abc123|alice|2026-03-01 10:00:00|trunk|Fix | in parser
def456|bob|2026-02-01 09:00:00||Initial
--- entry limit (2) reached ---
";
    let commits = parse_timeline(raw);
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].message, "Fix | in parser");
    assert_eq!(commits[0].branch.as_deref(), Some("trunk"));
    assert_eq!(commits[1].branch, None);
}

#[test]
fn test_classify_stderr() {
    let cases = [
        (
            "current directory is not within an open check-out",
            Some(FossilErrorCode::NotAFossilRepository),
        ),
        (
            "abort: would fork.  \"update\" first or use --branch",
            Some(FossilErrorCode::PushCreatesNewRemoteHead),
        ),
        ("abort: no such file: x.c", Some(FossilErrorCode::NoSuchFile)),
        ("cannot open x.c: No such file or directory", Some(FossilErrorCode::NoSuchFile)),
        ("remote not found: https://example.org/repo", None),
        ("branch not found: dev", None),
        ("there are unsaved changes in the current checkout", Some(FossilErrorCode::UnsavedChanges)),
        ("server says: login failed", Some(FossilErrorCode::AuthenticationFailed)),
        ("branch \"dev\" already exists", Some(FossilErrorCode::BranchAlreadyExists)),
        ("something odd", None),
    ];
    for (stderr, expected) in cases {
        assert_eq!(classify_stderr(stderr), expected, "{stderr}");
    }
}

#[test]
fn test_untracked_filenames_collects_indented_lines() {
    let stderr = "\
abort: untracked files in working directory differ:
  a.txt
  dir/b.txt
please move them out of the way
";
    assert_eq!(
        untracked_filenames(stderr),
        vec!["a.txt".to_string(), "dir/b.txt".to_string()]
    );
    assert_eq!(classify_stderr(stderr), Some(FossilErrorCode::UntrackedFilesDiffer));
}

#[test]
fn test_locate_accepts_explicit_path() {
    let explicit = FossilCli::locate("/opt/fossil/bin/fossil").unwrap();
    assert_eq!(explicit, std::path::PathBuf::from("/opt/fossil/bin/fossil"));
}

#[tokio::test]
async fn test_scripted_fossil_records_calls_and_failures() {
    let fossil = ScriptedFossil::new("/repo");
    fossil.set_status("EDITED a.txt\n");
    fossil.fail_next(
        "push",
        FossilError::new("push failed").with_code(FossilErrorCode::PushCreatesNewRemoteHead),
    );

    let status = fossil.get_status().await.unwrap();
    assert_eq!(fossil.parse_status_lines(&status).len(), 1);

    let err = fossil.push().await.unwrap_err();
    assert_eq!(err.code(), Some(FossilErrorCode::PushCreatesNewRemoteHead));
    assert!(fossil.push().await.is_ok());

    fossil
        .add(&["x.txt".to_string(), "y.txt".to_string()])
        .await
        .unwrap();
    assert_eq!(fossil.calls(), vec!["status", "push", "push", "add x.txt y.txt"]);
    assert_eq!(fossil.count("push"), 2);
}
