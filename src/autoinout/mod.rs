// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Periodic incoming/outgoing probe.
//!
//! ```text
//!            enable()
//! Disabled ----------> Enabled <-------------+
//!    ^                    |                  |
//!    | disable()          | interval tick    | success (counts)
//!    | / dispose          v                  |
//!    +------------- Syncing -----------------+
//!                         |
//!                         | failure
//!                         v
//!                       Error  -- next tick --> Syncing
//! ```
//!
//! The poller task holds a `Weak` reference to the repository. It exits
//! when the repository is dropped, disposed, or the poller is disabled.

use std::sync::{Arc, PoisonError, Weak};
use std::time::SystemTime;

use tokio::time;
use tracing::{debug, info, warn};

use crate::error::SyncResult;
use crate::repository::{Inner, Repository, RepositoryState};

/// Poller status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutoInOutStatus {
    #[default]
    Disabled,
    Enabled,
    /// A probe is in flight.
    Syncing,
    Error,
}

/// Observable poller state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoInOutState {
    pub status: AutoInOutStatus,
    pub next_check_time: Option<SystemTime>,
    /// Normalized message of the last failed probe.
    pub error: Option<String>,
    pub incoming: usize,
    pub outgoing: usize,
}

impl Repository {
    /// Starts polling: probes now, then every configured interval.
    ///
    /// Calling it while the poller runs does nothing.
    pub fn enable_auto_in_out(&self) {
        if self.state() == RepositoryState::Disposed {
            return;
        }

        let token = {
            let mut poller = self
                .inner
                .poller
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if poller.as_ref().is_some_and(|t| !t.is_cancelled()) {
                return;
            }
            let token = self.inner.shutdown.child_token();
            *poller = Some(token.clone());
            token
        };

        self.change_auto_in_out_state(|s| s.status = AutoInOutStatus::Enabled);
        info!(
            interval_ms = self.inner.settings.auto_in_out_interval().as_millis(),
            "auto in/out enabled"
        );

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let interval = self.inner.settings.auto_in_out_interval();

        tokio::spawn(async move {
            loop {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let repo = Repository { inner };
                repo.change_auto_in_out_state(|s| {
                    s.next_check_time = SystemTime::now().checked_add(interval);
                });

                tokio::select! {
                    () = token.cancelled() => return,
                    result = repo.refresh_auto_in_out() => {
                        if let Err(err) = result {
                            debug!(error = %err, "auto in/out probe skipped");
                        }
                    }
                }
                drop(repo);

                tokio::select! {
                    () = token.cancelled() => return,
                    () = time::sleep(interval) => {}
                }
            }
        });
    }

    /// Stops polling and marks the poller disabled.
    pub fn disable_auto_in_out(&self) {
        let token = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
        }
        self.change_auto_in_out_state(|s| {
            s.status = AutoInOutStatus::Disabled;
            s.next_check_time = None;
        });
        info!("auto in/out disabled");
    }

    /// Runs one divergence probe once the repository is idle and focused.
    ///
    /// Concurrent calls share one probe. Probe failures are recorded in the
    /// poller state, not returned.
    ///
    /// # Errors
    ///
    /// Only fails if the shared probe future itself fails, which the probe
    /// body never does.
    pub async fn refresh_auto_in_out(&self) -> SyncResult<()> {
        let this = self.clone();
        self.probe_throttled(move || async move {
            if this.state() == RepositoryState::Disposed {
                return Ok(());
            }
            this.when_idle_and_focused().await;
            this.change_auto_in_out_state(|s| {
                if s.status != AutoInOutStatus::Disabled {
                    s.status = AutoInOutStatus::Syncing;
                }
            });

            match this.inner.fossil.check_divergence().await {
                Ok(divergence) => {
                    debug!(
                        incoming = divergence.incoming,
                        outgoing = divergence.outgoing,
                        "divergence checked"
                    );
                    this.change_auto_in_out_state(|s| {
                        if s.status != AutoInOutStatus::Disabled {
                            s.status = AutoInOutStatus::Enabled;
                        }
                        s.error = None;
                        s.incoming = divergence.incoming;
                        s.outgoing = divergence.outgoing;
                    });
                }
                Err(err) => {
                    let message = err.normalized_message();
                    warn!(error = %message, "divergence check failed");
                    this.change_auto_in_out_state(|s| {
                        if s.status != AutoInOutStatus::Disabled {
                            s.status = AutoInOutStatus::Error;
                        }
                        s.error = Some(message);
                    });
                }
            }
            Ok(())
        })
        .await
    }
}
