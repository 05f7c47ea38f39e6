// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `fscm watch`: keeps the model live and prints its events.
//!
//! ```text
//! notify watcher --flume--> on_fs_change --> Debouncer --> status refresh
//!                                                              |
//! stdout <-- describe_event <-- broadcast<RepositoryEvent> <---+
//! ```

use anyhow::Context;
use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::repository::{Repository, RepositoryEvent, RepositoryState};

/// One-line description of an event, or `None` for events not worth printing.
#[must_use]
pub fn describe_event(repo: &Repository, event: &RepositoryEvent) -> Option<String> {
    match event {
        RepositoryEvent::StateChanged(state) => Some(format!("state: {state}")),
        RepositoryEvent::StatusChanged => {
            let branch = repo
                .current_branch()
                .map_or_else(|| "(detached)".to_string(), |b| b.name);
            Some(format!("status: {branch}, {} change(s)", repo.count()))
        }
        RepositoryEvent::InOutStateChanged => {
            let state = repo.auto_in_out_state();
            Some(format!(
                "in/out: {} incoming, {} outgoing",
                state.incoming, state.outgoing
            ))
        }
        RepositoryEvent::RunStarted(kind) => Some(format!("running: {kind}")),
        RepositoryEvent::RepositoryChanged(path) => {
            Some(format!("checkout database changed: {}", path.display()))
        }
        RepositoryEvent::ResourcesChanged | RepositoryEvent::RunFinished(_) => None,
    }
}

/// Watches the checkout until Ctrl-C or until the repository goes away.
///
/// # Errors
///
/// Returns an error if the file watcher cannot be started.
pub async fn run_watch_command(repo: Repository) -> Result<()> {
    let (tx, rx) = flume::unbounded::<Event>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let _ = tx.send(event);
        }
        Err(e) => warn!(error = %e, "file watcher error"),
    })
    .context("failed to create file watcher")?;
    watcher
        .watch(repo.root(), RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", repo.root().display()))?;

    info!(root = %repo.root().display(), "watching checkout");
    for line in crate::cmd::repo::render_status(repo.current_branch().as_ref(), &repo.groups()) {
        println!("{line}");
    }

    let mut events = repo.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
            received = rx.recv_async() => {
                let Ok(event) = received else { break };
                for path in &event.paths {
                    repo.on_fs_change(path);
                }
            }
            received = events.recv() => match received {
                Ok(event) => {
                    if let Some(line) = describe_event(&repo, &event) {
                        println!("{line}");
                    }
                    if event == RepositoryEvent::StateChanged(RepositoryState::Disposed) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    drop(watcher);
    repo.dispose();
    Ok(())
}
