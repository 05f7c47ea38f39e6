// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{OperationKind, OperationSet};

#[test]
fn test_new_set_is_idle() {
    let ops = OperationSet::new();
    assert!(ops.is_idle());
    assert_eq!(ops.running().count(), 0);
    assert_eq!(ops, OperationSet::default());
}

#[test]
fn test_start_and_end_are_pure() {
    let idle = OperationSet::new();
    let pulling = idle.start(OperationKind::Pull);

    assert!(idle.is_idle());
    assert!(pulling.is_running(OperationKind::Pull));
    assert!(!pulling.is_running(OperationKind::Push));
    assert!(pulling.end(OperationKind::Pull).is_idle());
    assert!(pulling.is_running(OperationKind::Pull));
}

#[test]
fn test_idle_only_after_every_started_kind_ends() {
    let kinds = [
        OperationKind::Status,
        OperationKind::Commit,
        OperationKind::Show,
        OperationKind::Ignore,
    ];
    let mut ops = OperationSet::new();
    for kind in kinds {
        ops = ops.start(kind);
    }

    for (i, kind) in kinds.iter().enumerate() {
        assert!(!ops.is_idle(), "idle with {} kinds left", kinds.len() - i);
        ops = ops.end(*kind);
    }
    assert!(ops.is_idle());
}

#[test]
fn test_end_order_does_not_matter() {
    let started = OperationSet::new()
        .start(OperationKind::Pull)
        .start(OperationKind::Show)
        .start(OperationKind::Close);

    let forward = started
        .end(OperationKind::Pull)
        .end(OperationKind::Show)
        .end(OperationKind::Close);
    let backward = started
        .end(OperationKind::Close)
        .end(OperationKind::Show)
        .end(OperationKind::Pull);

    assert_eq!(forward, backward);
    assert!(forward.is_idle());
}

#[test]
fn test_ending_unstarted_kind_is_harmless() {
    let ops = OperationSet::new().start(OperationKind::Merge);
    let ops = ops.end(OperationKind::Update);
    assert!(ops.is_running(OperationKind::Merge));
    assert!(ops.end(OperationKind::Merge).is_idle());
}

#[test]
fn test_every_kind_has_its_own_bit() {
    let mut ops = OperationSet::new();
    for kind in OperationKind::all() {
        assert!(!ops.is_running(*kind), "{kind} shares a bit");
        ops = ops.start(*kind);
    }
    assert_eq!(ops.running().count(), OperationKind::all().len());
    assert_eq!(OperationKind::all().len(), 24);
}

#[test]
fn test_read_only_kinds() {
    let read_only: Vec<_> = OperationKind::all()
        .iter()
        .copied()
        .filter(|kind| kind.is_read_only())
        .collect();
    assert_eq!(
        read_only,
        vec![OperationKind::Show, OperationKind::GetCommitTemplate]
    );
}

#[test]
fn test_display_and_debug() {
    assert_eq!(OperationKind::UndoDryRun.to_string(), "undo_dry_run");

    let ops = OperationSet::new()
        .start(OperationKind::Push)
        .start(OperationKind::Status);
    assert_eq!(format!("{ops:?}"), "{Status, Push}");
}
