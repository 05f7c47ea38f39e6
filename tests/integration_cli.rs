// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for CLI parsing.
//!
//! Tests the CLI module with realistic command-line argument patterns.

use std::path::PathBuf;

use clap::Parser;
use fossil_scm_sync::cli::repo::ScopeArg;
use fossil_scm_sync::cli::{Cli, Command};

// =============================================================================
// Meta Commands
// =============================================================================

#[test]
fn cli_version_alias() {
    let cli = Cli::try_parse_from(["fscm", "-v"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn cli_no_command() {
    let cli = Cli::try_parse_from(["fscm"]).unwrap();
    assert!(cli.command.is_none());
}

#[test]
fn cli_unknown_command_rejected() {
    assert!(Cli::try_parse_from(["fscm", "build"]).is_err());
}

#[test]
fn cli_options_and_inis() {
    let cli = Cli::try_parse_from(["fscm", "-i", "a.toml", "-i", "b.toml", "inis"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Inis)));
    assert_eq!(
        cli.global.inis,
        vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]
    );

    let cli = Cli::try_parse_from(["fscm", "options"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Options)));
}

// =============================================================================
// Checkout Commands
// =============================================================================

#[test]
fn cli_status_and_watch() {
    let cli = Cli::try_parse_from(["fscm", "status"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Status(ref args)) if !args.json));

    let cli = Cli::try_parse_from(["fscm", "-C", "/src/checkout", "watch"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Watch)));
    assert_eq!(cli.global.repository, Some(PathBuf::from("/src/checkout")));
}

#[test]
fn cli_commit_with_files() {
    let cli = Cli::try_parse_from([
        "fscm",
        "commit",
        "--message",
        "Add parser",
        "src/parse.rs",
        "src/lib.rs",
    ])
    .unwrap();
    let Some(Command::Commit(args)) = cli.command else {
        panic!("expected commit");
    };
    assert_eq!(args.message, "Add parser");
    assert_eq!(args.scope, ScopeArg::All);
    assert_eq!(args.files, vec!["src/parse.rs", "src/lib.rs"]);
}

#[test]
fn cli_commit_rejects_unknown_scope() {
    let result = Cli::try_parse_from(["fscm", "commit", "-m", "x", "--scope", "everything"]);
    assert!(result.is_err());
}

#[test]
fn cli_log_options() {
    let cli =
        Cli::try_parse_from(["fscm", "log", "src/lib.rs", "-r", "trunk", "-n", "20"]).unwrap();
    let Some(Command::Log(args)) = cli.command else {
        panic!("expected log");
    };
    assert_eq!(args.file, Some(PathBuf::from("src/lib.rs")));
    assert_eq!(args.rev.as_deref(), Some("trunk"));
    assert_eq!(args.limit, Some(20));
}

#[test]
fn cli_show_checkin() {
    let cli = Cli::try_parse_from(["fscm", "show", "README.md", "--checkin", "tip"]).unwrap();
    let Some(Command::Show(args)) = cli.command else {
        panic!("expected show");
    };
    assert_eq!(args.checkin, "tip");
}

#[test]
fn cli_pull_push_update_undo() {
    assert!(matches!(
        Cli::try_parse_from(["fscm", "pull"]).unwrap().command,
        Some(Command::Pull)
    ));
    assert!(matches!(
        Cli::try_parse_from(["fscm", "push"]).unwrap().command,
        Some(Command::Push)
    ));

    let cli = Cli::try_parse_from(["fscm", "update"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Command::Update(ref args)) if args.treeish.is_none() && !args.discard
    ));

    let cli = Cli::try_parse_from(["fscm", "undo", "-n"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Undo(ref args)) if args.dry_run));
}

// =============================================================================
// Global Options
// =============================================================================

#[test]
fn cli_global_options_to_overrides() {
    let cli = Cli::try_parse_from([
        "fscm",
        "-s",
        "fossil/path=/opt/fossil",
        "--file-log-level",
        "6",
        "--log-file",
        "/tmp/fscm.log",
        "status",
    ])
    .unwrap();

    insta::assert_snapshot!(cli.global.to_config_overrides().join("\n"), @r"
    fossil/path=/opt/fossil
    global.file_log_level=6
    global.log_file=/tmp/fscm.log
    ");
}
