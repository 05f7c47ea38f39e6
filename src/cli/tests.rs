// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use crate::cli::global::parse_override;
use crate::cli::repo::ScopeArg;
use crate::cli::{Cli, Command};
use crate::repository::CommitScope;
use clap::Parser;

#[test]
fn test_parse_version() {
    let cli = Cli::try_parse_from(["fscm", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn test_parse_global_options() {
    let cli = Cli::try_parse_from([
        "fscm",
        "-l",
        "5",
        "-C",
        "/work/project",
        "-s",
        "sync.debounce_ms=200",
        "status",
        "--json",
    ])
    .unwrap();

    assert_eq!(cli.global.log_level, Some(5));
    assert_eq!(cli.global.repository, Some(PathBuf::from("/work/project")));
    assert!(matches!(cli.command, Some(Command::Status(ref args)) if args.json));
    assert_eq!(
        cli.global.to_config_overrides(),
        vec![
            "sync.debounce_ms=200",
            "global.output_log_level=5",
            "global.file_log_level=5",
        ]
    );
}

#[test]
fn test_global_options_after_subcommand() {
    let cli = Cli::try_parse_from(["fscm", "pull", "--log-file", "sync.log"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Pull)));
    assert_eq!(cli.global.log_file, Some(PathBuf::from("sync.log")));
}

#[test]
fn test_log_level_range() {
    assert!(Cli::try_parse_from(["fscm", "-l", "7", "status"]).is_err());
}

#[test]
fn test_parse_commit() {
    let cli = Cli::try_parse_from([
        "fscm", "commit", "-m", "Fix parser", "--scope", "staged", "a.txt",
    ])
    .unwrap();
    let Some(Command::Commit(args)) = cli.command else {
        panic!("expected commit");
    };
    assert_eq!(args.message, "Fix parser");
    assert_eq!(args.scope, ScopeArg::Staged);
    assert_eq!(args.files, vec!["a.txt"]);
    assert_eq!(CommitScope::from(args.scope), CommitScope::StagedChanges);
}

#[test]
fn test_commit_requires_message() {
    assert!(Cli::try_parse_from(["fscm", "commit"]).is_err());
}

#[test]
fn test_parse_update_undo_show() {
    let cli = Cli::try_parse_from(["fscm", "update", "trunk", "--discard"]).unwrap();
    let Some(Command::Update(args)) = cli.command else {
        panic!("expected update");
    };
    assert_eq!(args.treeish.as_deref(), Some("trunk"));
    assert!(args.discard);

    let cli = Cli::try_parse_from(["fscm", "undo", "--dry-run"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Undo(ref args)) if args.dry_run));

    let cli = Cli::try_parse_from(["fscm", "show", "src/main.rs"]).unwrap();
    let Some(Command::Show(args)) = cli.command else {
        panic!("expected show");
    };
    assert_eq!(args.path, PathBuf::from("src/main.rs"));
    assert_eq!(args.checkin, "current");
}

#[test]
fn test_parse_override() {
    assert_eq!(
        parse_override("sync.debounce_ms=500").unwrap(),
        ("sync.debounce_ms".to_string(), "500".to_string())
    );
    assert_eq!(
        parse_override("fossil/path = /opt/fossil").unwrap(),
        ("fossil.path".to_string(), "/opt/fossil".to_string())
    );
    assert!(parse_override("debounce_ms=500").is_err());
    assert!(parse_override("sync.debounce_ms").is_err());
}
