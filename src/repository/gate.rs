// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Idle/focus gate.
//!
//! ```text
//!        +-----------------+
//!   +--> | ops idle?       | -- no --> await next operation change --+
//!   |    +-----------------+                                         |
//!   |           | yes                                                |
//!   |           v                                                    |
//!   |    +-----------------+                                         |
//!   |    | window focused? | -- no --> await next focus change ------+
//!   |    +-----------------+                                         |
//!   |           | yes                                                |
//!   |           v                                                    |
//!   |        return                                                  |
//!   +----------------------------------------------------------------+
//! ```

use super::Repository;

impl Repository {
    /// Suspends until no operation is in flight and the window is focused.
    ///
    /// Both conditions are checked together after every wake-up. There is no
    /// timeout; race it against a timer if one is needed.
    pub async fn when_idle_and_focused(&self) {
        let mut operations = self.inner.operations.subscribe();
        let mut focus = self.inner.focus.subscribe();

        loop {
            let idle = operations.borrow_and_update().is_idle();
            if !idle {
                if operations.changed().await.is_err() {
                    // Sender lives in `Inner`, which `self` keeps alive.
                    std::future::pending::<()>().await;
                }
                continue;
            }

            let focused = *focus.borrow_and_update();
            if !focused {
                if focus.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
                continue;
            }

            return;
        }
    }
}
