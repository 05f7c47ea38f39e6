// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Call coalescing: throttle and debounce wrappers.
//!
//! ```text
//! Throttle<T>                         Debouncer<A>
//!
//! call ──┐                            call(a1) ─┐
//! call ──┼─> slot empty? ─ yes ─> run  call(a2) ─┼─> reset window
//! call ──┘        │                   call(a3) ─┘        │
//!                 no                                     v
//!                 │                       window elapsed, no call
//!                 v                                      │
//!         join in-flight Shared                          v
//!         (same Ok / same Err)               spawn action(a3)
//!
//! slot is cleared by the wrapped future itself once it settles; it only
//! holds a weak handle, so a call every waiter dropped lapses with it
//! ```
//!
//! Each repository method owns its own [`Throttle`], so coalescing is keyed
//! by method and by instance. A joiner's own arguments are ignored; it gets
//! whatever the running call produces.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared, WeakShared};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{trace, warn};

use crate::error::SyncResult;

/// Future handed to every caller of a throttled method.
pub type SharedCall<T> = Shared<BoxFuture<'static, SyncResult<T>>>;

struct Slot<T>
where
    T: Clone,
{
    generation: u64,
    /// Weak: a call abandoned by every waiter is dropped with its captures.
    call: Option<WeakShared<BoxFuture<'static, SyncResult<T>>>>,
}

impl<T> Slot<T>
where
    T: Clone,
{
    fn in_flight(&self) -> Option<SharedCall<T>> {
        self.call.as_ref().and_then(WeakShared::upgrade)
    }
}

/// At-most-one concurrent execution of an async method.
pub struct Throttle<T>
where
    T: Clone,
{
    name: &'static str,
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Throttle<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                call: None,
            })),
        }
    }

    /// Joins the in-flight call, or starts a new one built by `make`.
    ///
    /// `make` runs with the slot locked and must not call back into the same
    /// throttle. A call that every waiter dropped before it settled counts
    /// as finished; the next caller starts a fresh one.
    pub fn call<F, Fut>(&self, make: F) -> SharedCall<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SyncResult<T>> + Send + 'static,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(call) = slot.in_flight() {
            trace!(method = self.name, "joining in-flight call");
            return call;
        }

        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;
        let owner: Weak<Mutex<Slot<T>>> = Arc::downgrade(&self.slot);
        let inner = make();

        let call = async move {
            let result = inner.await;
            if let Some(owner) = owner.upgrade() {
                let mut slot = owner.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.generation == generation {
                    slot.call = None;
                }
            }
            result
        }
        .boxed()
        .shared();

        slot.call = call.downgrade();
        call
    }

    /// True while a call is in flight and someone still waits on it.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight()
            .is_some()
    }
}

/// Trailing-edge debounce: one execution per quiet window, last args win.
///
/// The timer lives in a task spawned on construction; dropping the
/// debouncer ends the task and discards any pending call.
pub struct Debouncer<A> {
    tx: mpsc::UnboundedSender<A>,
}

impl<A> Debouncer<A>
where
    A: Send + 'static,
{
    /// Spawns the debounce task. Must be called inside a tokio runtime.
    pub fn new<F, Fut>(name: &'static str, window: Duration, action: F) -> Self
    where
        F: Fn(A) -> Fut + Send + 'static,
        Fut: Future<Output = SyncResult<()>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<A>();

        tokio::spawn(async move {
            while let Some(mut args) = rx.recv().await {
                loop {
                    match time::timeout(window, rx.recv()).await {
                        Ok(Some(next)) => args = next,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }

                trace!(method = name, "debounce window elapsed");
                let fut = action(args);
                tokio::spawn(async move {
                    if let Err(err) = fut.await {
                        warn!(method = name, error = %err, "debounced call failed");
                    }
                });
            }
        });

        Self { tx }
    }

    /// Schedules a call; resets the quiet window.
    pub fn call(&self, args: A) {
        // Send only fails once the task is gone, i.e. the runtime shut down.
        let _ = self.tx.send(args);
    }
}

#[cfg(test)]
mod tests;
