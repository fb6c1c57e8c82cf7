// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level switch abstraction.
//!
//! A [`Switch`] ties together the transport, the [`Dispatcher`], the
//! [`StateTracker`] and the cached state:
//!
//! - set requests go through the dispatcher's immediate lane and update the
//!   cache when the device confirms them;
//! - [`Switch::refresh`] reads the device through the queued lane;
//! - the tracker polls in the background and notifies subscribers;
//! - [`Switch::read_cached`] answers from the cache without network I/O.
//!
//! ```no_run
//! use sonoff_diy::Switch;
//! use sonoff_diy::types::SwitchState;
//!
//! # async fn example() -> sonoff_diy::Result<()> {
//! let switch = Switch::http("192.168.1.40").build()?;
//! switch.start();
//!
//! switch.request_set(SwitchState::On).await?;
//! assert_eq!(switch.read_cached(), Some(SwitchState::On));
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "http")]
mod http_builder;

#[cfg(feature = "http")]
pub use http_builder::HttpSwitchBuilder;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::dispatcher::{Dispatcher, DispatcherConfig, Task};
use crate::error::{Error, Result, ValueError};
use crate::protocol::SwitchProtocol;
use crate::state::SwitchCache;
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::tracker::{self, StateTracker};
use crate::types::SwitchState;

#[cfg(feature = "http")]
use crate::protocol::{HttpClient, HttpConfig};

/// Scheduling configuration of a [`Switch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchConfig {
    dispatcher: DispatcherConfig,
    poll_interval: Duration,
}

impl SwitchConfig {
    /// Default interval between background polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the dispatcher timing.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Sets the background poll interval.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::ZeroDuration` for a zero interval.
    pub fn with_poll_interval(
        mut self,
        interval: Duration,
    ) -> std::result::Result<Self, ValueError> {
        if interval.is_zero() {
            return Err(ValueError::ZeroDuration("poll interval"));
        }
        self.poll_interval = interval;
        Ok(self)
    }

    /// Returns the dispatcher timing.
    #[must_use]
    pub fn dispatcher(&self) -> &DispatcherConfig {
        &self.dispatcher
    }

    /// Returns the background poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Reply slot shared by a task and its abandon hook; the first to answer wins.
struct Reply<T>(Arc<Mutex<Option<oneshot::Sender<Result<T>>>>>);

impl<T> Reply<T> {
    fn channel() -> (Self, oneshot::Receiver<Result<T>>) {
        let (tx, rx) = oneshot::channel();
        (Self(Arc::new(Mutex::new(Some(tx)))), rx)
    }

    fn send(&self, result: Result<T>) {
        if let Some(tx) = self.0.lock().take() {
            // The caller may have given up waiting.
            let _ = tx.send(result);
        }
    }
}

impl<T> Clone for Reply<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// A single on/off device behind a rate-limited dispatcher.
pub struct Switch<P: SwitchProtocol> {
    client: Arc<P>,
    dispatcher: Dispatcher,
    cache: Arc<SwitchCache>,
    callbacks: Arc<CallbackRegistry>,
    tracker: StateTracker<P>,
    config: SwitchConfig,
}

#[cfg(feature = "http")]
impl Switch<HttpClient> {
    /// Creates a builder for a switch reachable at `host`.
    #[must_use]
    pub fn http(host: impl Into<String>) -> HttpSwitchBuilder {
        HttpSwitchBuilder::new(HttpConfig::new(host))
    }

    /// Creates a builder from an existing HTTP configuration.
    #[must_use]
    pub fn http_config(config: HttpConfig) -> HttpSwitchBuilder {
        HttpSwitchBuilder::new(config)
    }
}

impl<P: SwitchProtocol> Switch<P> {
    /// Creates a stopped switch over `client`.
    #[must_use]
    pub fn new(client: P, config: SwitchConfig) -> Self {
        let client = Arc::new(client);
        let dispatcher = Dispatcher::new(config.dispatcher);
        let cache = Arc::new(SwitchCache::new());
        let callbacks = Arc::new(CallbackRegistry::new());
        let tracker = StateTracker::new(
            Arc::clone(&client),
            dispatcher.clone(),
            Arc::clone(&cache),
            Arc::clone(&callbacks),
        );

        Self {
            client,
            dispatcher,
            cache,
            callbacks,
            tracker,
            config,
        }
    }

    /// Starts the dispatcher tick loop and the background poller.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn start(&self) {
        self.dispatcher.start();
        if !self.tracker.is_running() {
            self.tracker.start(self.config.poll_interval);
        }
    }

    /// Stops polling and dispatching. Pending commands fail with
    /// [`Error::Cancelled`].
    pub fn stop(&self) {
        self.tracker.stop();
        self.dispatcher.stop();
    }

    /// Returns the scheduling configuration.
    #[must_use]
    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Returns the dispatcher serializing device access.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the background state tracker.
    #[must_use]
    pub fn tracker(&self) -> &StateTracker<P> {
        &self.tracker
    }

    /// Returns the last confirmed state without touching the network.
    ///
    /// `None` until a set or a read has succeeded.
    #[must_use]
    pub fn read_cached(&self) -> Option<SwitchState> {
        self.cache.get()
    }

    /// Drives the relay to `state` through the immediate lane.
    ///
    /// Resolves once the device has answered. On success the cached state
    /// becomes `state`; on failure it is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns the device or transport error, `ProtocolError::Timeout` if
    /// the dispatcher's task timeout fired, or [`Error::Cancelled`] if the
    /// dispatcher was stopped before the command started.
    pub async fn request_set(&self, state: impl Into<SwitchState>) -> Result<()> {
        let state = state.into();
        let (reply, rx) = Reply::channel();
        let abandoned = reply.clone();
        let client = Arc::clone(&self.client);
        let cache = Arc::clone(&self.cache);

        let task = Task::new("set_switch", async move {
            let result = client.set_switch(state).await;
            if result.is_ok() {
                cache.store(state);
            }
            reply.send(result.clone());
            result
        })
        .on_abandon(move |error| abandoned.send(Err(error)));
        self.dispatcher.submit_immediate(task);

        rx.await.map_err(|_| Error::Cancelled)?
    }

    /// Turns the relay on.
    ///
    /// # Errors
    ///
    /// See [`request_set`](Self::request_set).
    pub async fn turn_on(&self) -> Result<()> {
        self.request_set(SwitchState::On).await
    }

    /// Turns the relay off.
    ///
    /// # Errors
    ///
    /// See [`request_set`](Self::request_set).
    pub async fn turn_off(&self) -> Result<()> {
        self.request_set(SwitchState::Off).await
    }

    /// Reads the device through the queued lane.
    ///
    /// Unlike a background poll this read is never skipped: it waits behind
    /// pending set requests. A changed state notifies subscribers exactly as
    /// a poll would.
    ///
    /// # Errors
    ///
    /// Returns the device, transport or parse error, the task timeout, or
    /// [`Error::Cancelled`] if the dispatcher dropped the read.
    pub async fn refresh(&self) -> Result<SwitchState> {
        let (reply, rx) = Reply::channel();
        let abandoned = reply.clone();
        let client = Arc::clone(&self.client);
        let cache = Arc::clone(&self.cache);
        let callbacks = Arc::clone(&self.callbacks);

        let task = Task::new("refresh", async move {
            let result = client.get_switch().await;
            if let Ok(observed) = &result {
                tracker::apply_observation(&cache, &callbacks, *observed);
            }
            reply.send(result.clone());
            result.map(|_| ())
        })
        .on_abandon(move |error| abandoned.send(Err(error)));
        self.dispatcher.submit_queued(task);

        rx.await.map_err(|_| Error::Cancelled)?
    }
}

impl<P: SwitchProtocol> Subscribable for Switch<P> {
    fn on_switch_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(SwitchState) + Send + Sync + 'static,
    {
        self.callbacks.on_switch_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.unsubscribe(id)
    }
}

impl<P: SwitchProtocol> std::fmt::Debug for Switch<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Switch")
            .field("state", &self.cache.get())
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
