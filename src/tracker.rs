// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic reconciliation of the cached switch state.
//!
//! The [`StateTracker`] reads the device on a fixed interval through
//! [`Dispatcher::attempt_now`]. A poll that fires while a command is running
//! or cooling down is skipped, not queued: the next firing is the retry.
//! When a read differs from the cache, the cache is updated and the
//! registered callbacks are notified.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::dispatcher::{Dispatcher, Task};
use crate::protocol::SwitchProtocol;
use crate::state::SwitchCache;
use crate::subscription::CallbackRegistry;
use crate::types::SwitchState;

/// Polls the device and raises change notifications.
///
/// The poll timer is owned by the tracker: [`stop`](Self::stop) or dropping
/// the tracker ends it.
pub struct StateTracker<P: SwitchProtocol> {
    client: Arc<P>,
    dispatcher: Dispatcher,
    cache: Arc<SwitchCache>,
    callbacks: Arc<CallbackRegistry>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl<P: SwitchProtocol> StateTracker<P> {
    /// Creates a stopped tracker sharing `cache` and `callbacks` with its owner.
    #[must_use]
    pub fn new(
        client: Arc<P>,
        dispatcher: Dispatcher,
        cache: Arc<SwitchCache>,
        callbacks: Arc<CallbackRegistry>,
    ) -> Self {
        Self {
            client,
            dispatcher,
            cache,
            callbacks,
            poller: Mutex::new(None),
        }
    }

    /// Starts polling every `interval`. The first poll fires one interval
    /// from now. A running poll timer is replaced.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero or if called outside of a tokio runtime.
    pub fn start(&self, interval: Duration) {
        let client = Arc::clone(&self.client);
        let dispatcher = self.dispatcher.clone();
        let cache = Arc::clone(&self.cache);
        let callbacks = Arc::clone(&self.callbacks);

        tracing::debug!(interval_ms = interval.as_millis(), "Starting state tracker");

        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticks.tick().await;
                let task = poll_task(
                    Arc::clone(&client),
                    Arc::clone(&cache),
                    Arc::clone(&callbacks),
                );
                if !dispatcher.attempt_now(task) {
                    tracing::trace!("Dispatcher busy, poll skipped");
                }
            }
        });

        if let Some(previous) = self.poller.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stops polling. A poll already handed to the dispatcher still completes.
    pub fn stop(&self) {
        if let Some(handle) = self.poller.lock().take() {
            handle.abort();
            tracing::debug!("Stopped state tracker");
        }
    }

    /// Returns `true` while the poll timer is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.poller
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Polls once, outside the timer, with the same skip-if-busy policy.
    ///
    /// Returns `false` if the dispatcher was busy and nothing was sent.
    pub fn poll_now(&self) -> bool {
        self.dispatcher.attempt_now(poll_task(
            Arc::clone(&self.client),
            Arc::clone(&self.cache),
            Arc::clone(&self.callbacks),
        ))
    }
}

impl<P: SwitchProtocol> Drop for StateTracker<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.get_mut().take() {
            handle.abort();
        }
    }
}

impl<P: SwitchProtocol> std::fmt::Debug for StateTracker<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTracker")
            .field("cache", &self.cache)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Builds the task that reads the device and reconciles the cache.
///
/// A failed read leaves the cache untouched; the dispatcher logs the error.
fn poll_task<P: SwitchProtocol>(
    client: Arc<P>,
    cache: Arc<SwitchCache>,
    callbacks: Arc<CallbackRegistry>,
) -> Task {
    Task::new("poll", async move {
        let observed = client.get_switch().await?;
        apply_observation(&cache, &callbacks, observed);
        Ok(())
    })
}

/// Records a successful read and notifies subscribers if it changed the cache.
pub(crate) fn apply_observation(
    cache: &SwitchCache,
    callbacks: &CallbackRegistry,
    observed: SwitchState,
) {
    if cache.reconcile(observed) {
        tracing::info!(state = %observed, "Switch state changed on device");
        callbacks.dispatch(observed);
    }
}
