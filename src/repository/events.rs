// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Observer-facing notifications and lifecycle state.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use crate::operation::OperationKind;

/// Repository lifecycle. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepositoryState {
    #[default]
    Idle,
    Disposed,
}

impl fmt::Display for RepositoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Disposed => "disposed",
        })
    }
}

/// Broadcast to every subscriber of a repository.
///
/// Delivery follows emission order; `RunFinished` events therefore arrive in
/// the order operations complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryEvent {
    StateChanged(RepositoryState),
    /// Group contents changed outside a full refresh (stage, unstage, reset).
    ResourcesChanged,
    /// A full status refresh finished.
    StatusChanged,
    InOutStateChanged,
    RunStarted(OperationKind),
    RunFinished(OperationKind),
    /// The checkout database changed on disk.
    RepositoryChanged(PathBuf),
}

/// Shared "editor window has focus" flag.
///
/// Cheap to clone; every clone observes and drives the same flag.
#[derive(Debug, Clone)]
pub struct WindowFocus {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for WindowFocus {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WindowFocus {
    #[must_use]
    pub fn new(focused: bool) -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(focused)),
        }
    }

    pub fn set_focused(&self, focused: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != focused;
            *current = focused;
            changed
        });
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
