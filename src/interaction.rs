// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! User prompts the coordinator needs answered.
//!
//! The engine never talks to a UI directly; the host plugs in an
//! [`Interaction`] implementation. [`Unattended`] is used by the `fscm`
//! binary and never pulls on its own.

use futures_util::future::{BoxFuture, FutureExt};
use tracing::warn;

/// Answer to "pushing would create a new remote head".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCreatesNewHeadAction {
    /// Pull first, then let the user push again.
    Pull,
    Cancel,
}

/// Prompts raised by repository operations.
pub trait Interaction: Send + Sync {
    fn warn_push_creates_new_head(&self) -> BoxFuture<'_, PushCreatesNewHeadAction>;

    /// `close` refused because of unsaved changes.
    fn warn_unsaved_changes(&self, message: &str);
}

/// Non-interactive policy: log and cancel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unattended;

impl Interaction for Unattended {
    fn warn_push_creates_new_head(&self) -> BoxFuture<'_, PushCreatesNewHeadAction> {
        async {
            warn!("push would create a new remote head; pull and merge first");
            PushCreatesNewHeadAction::Cancel
        }
        .boxed()
    }

    fn warn_unsaved_changes(&self, message: &str) {
        warn!(message, "checkout not closed");
    }
}
