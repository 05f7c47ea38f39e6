// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;

use clap::Parser;
use insta::assert_snapshot;

use crate::cli::Cli;
use crate::cmd::config::build_config_loader;
use crate::cmd::repo::{render_status, status_json};
use crate::fossil::Ref;
use crate::logging::LogLevel;
use crate::resource::{
    FileResource, FileStatus, GroupKind, MergeStatus, Status, StatusGroups, group_statuses,
};

fn sample_groups() -> StatusGroups {
    let mut groups = StatusGroups::new();
    groups
        .get_mut(GroupKind::Staging)
        .update_resources(vec![FileResource::new(
            "src/lib.rs",
            Status::Modified,
            MergeStatus::None,
        )]);
    group_statuses(
        &[
            FileStatus::new(Status::Modified, "src/lib.rs"),
            FileStatus::new(Status::Renamed, "src/new.rs").with_rename_source("src/old.rs"),
            FileStatus::new(Status::Added, "README.md"),
            FileStatus::new(Status::Untracked, "notes.txt"),
        ],
        &mut groups,
    )
    .unwrap();
    groups
}

#[test]
fn test_render_status() {
    let groups = sample_groups();
    let lines = render_status(Some(&Ref::branch("trunk")), &groups);
    assert_snapshot!(lines.join("\n"), @r"
    On branch trunk
    Staged Changes:
      modified   src/lib.rs
    Changes:
      renamed    src/old.rs -> src/new.rs
      added      README.md
    Untracked Files:
      untracked  notes.txt
    ");
}

#[test]
fn test_render_status_clean() {
    let lines = render_status(None, &StatusGroups::new());
    assert_eq!(lines, vec!["Nothing changed"]);
}

#[test]
fn test_status_json() {
    let groups = sample_groups();
    let value = status_json(Some(&Ref::branch("trunk")), &groups);

    assert_eq!(value["branch"], "trunk");
    assert_eq!(value["count"], 4);
    assert_eq!(value["clean"], false);
    assert_eq!(value["groups"]["staging"][0]["path"], "src/lib.rs");
    assert_eq!(value["groups"]["working"][0]["rename"], "src/old.rs");
    assert_eq!(value["groups"]["working"][1]["status"], "added");
    assert!(value["groups"]["working"][1]["rename"].is_null());
    assert_eq!(value["groups"]["merge"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_config_loader_applies_cli_overrides() {
    let cli = Cli::try_parse_from([
        "fscm",
        "--no-default-inis",
        "-l",
        "2",
        "-s",
        "sync.debounce_ms=250",
        "-s",
        "fossil/username=alice",
        "status",
    ])
    .unwrap();

    let config = build_config_loader(&cli.global, Path::new("/nonexistent"))
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.global.output_log_level, LogLevel::WARN);
    assert_eq!(config.sync.debounce_ms, 250);
    assert_eq!(config.fossil.username.as_deref(), Some("alice"));
}

#[test]
fn test_config_loader_rejects_malformed_override() {
    let cli = Cli::try_parse_from(["fscm", "--no-default-inis", "-s", "debounce_ms", "status"])
        .unwrap();
    assert!(build_config_loader(&cli.global, Path::new("/nonexistent")).is_err());
}
