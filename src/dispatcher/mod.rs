// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rate-limited command dispatcher.
//!
//! The [`Dispatcher`] serializes access to the device:
//!
//! - at most one [`Task`] runs at any time;
//! - a task only starts on a scheduling tick, taken from the immediate lane
//!   before the queued lane;
//! - after a task finishes, successfully or not, the dispatcher stays busy
//!   for the configured cooldown before anything else may start.
//!
//! [`Dispatcher::attempt_now`] bypasses the lanes for repeatable background
//! work: it runs the task at once if the dispatcher is idle and drops it
//! otherwise.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use sonoff_diy::dispatcher::{Dispatcher, DispatcherConfig, Task};
//!
//! # async fn example() -> Result<(), sonoff_diy::error::ValueError> {
//! let dispatcher = Dispatcher::new(
//!     DispatcherConfig::new(4)?.with_cooldown(Duration::from_millis(200)),
//! );
//! dispatcher.start();
//!
//! dispatcher.submit_immediate(Task::new("greet", async {
//!     println!("running exclusively");
//!     Ok(())
//! }));
//! # Ok(())
//! # }
//! ```

mod config;
mod task;

pub use config::DispatcherConfig;
pub use task::{Lane, PendingTasks, Task};

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{Error, ProtocolError, Result};
use task::{AbandonHook, Lanes};

/// Serializes tasks against a single device.
///
/// `Dispatcher` is a cheap handle: clones share the same lanes and busy
/// flag. The tick loop only holds a weak reference, so it ends on its own
/// once every handle is dropped.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    config: DispatcherConfig,
    state: Mutex<DispatcherState>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Default)]
struct DispatcherState {
    /// Set while a task runs or cools down.
    busy: bool,
    lanes: Lanes,
}

impl Dispatcher {
    /// Creates an idle dispatcher. Call [`start`](Self::start) to begin ticking.
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(DispatcherState::default()),
                ticker: Mutex::new(None),
            }),
        }
    }

    /// Returns the timing configuration.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.shared.config
    }

    /// Starts the scheduling tick loop on the current tokio runtime.
    ///
    /// Calling `start` on a running dispatcher does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn start(&self) {
        let mut ticker = self.shared.ticker.lock();
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let period = self.shared.config.tick_interval();
        tracing::debug!(
            tick_ms = period.as_millis(),
            cooldown_ms = self.shared.config.cooldown().as_millis(),
            "Starting dispatcher"
        );
        *ticker = Some(tokio::spawn(run_ticker(Arc::downgrade(&self.shared), period)));
    }

    /// Stops the tick loop and drops every task still waiting in a lane.
    ///
    /// A task that is already running completes normally and the cooldown
    /// still applies. Callers waiting on a dropped task observe their
    /// channel closing.
    pub fn stop(&self) {
        if let Some(handle) = self.shared.ticker.lock().take() {
            handle.abort();
        }
        let dropped = self.shared.state.lock().lanes.clear();
        tracing::debug!(dropped, "Stopped dispatcher");
    }

    /// Returns `true` while the tick loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared
            .ticker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Returns `true` while a task runs or cools down.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.shared.state.lock().busy
    }

    /// Returns the number of tasks waiting in each lane.
    #[must_use]
    pub fn pending(&self) -> PendingTasks {
        self.shared.state.lock().lanes.pending()
    }

    /// Appends `task` to the immediate lane.
    pub fn submit_immediate(&self, task: Task) {
        self.submit(Lane::Immediate, task);
    }

    /// Appends `task` to the queued lane.
    ///
    /// Queued tasks only start on ticks where the immediate lane is empty.
    pub fn submit_queued(&self, task: Task) {
        self.submit(Lane::Queued, task);
    }

    fn submit(&self, lane: Lane, task: Task) {
        tracing::trace!(task = task.label(), ?lane, "Task submitted");
        self.shared.state.lock().lanes.push(lane, task);
    }

    /// Runs `task` right away if the dispatcher is idle.
    ///
    /// When the dispatcher is busy the task is dropped without being queued
    /// and `false` is returned. Meant for repeatable work such as polling,
    /// where the next natural trigger is the retry.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn attempt_now(&self, task: Task) -> bool {
        {
            let mut state = self.shared.state.lock();
            if state.busy {
                tracing::trace!(task = task.label(), "Dispatcher busy, attempt skipped");
                return false;
            }
            state.busy = true;
        }
        self.shared.execute("attempt", task);
        true
    }
}

async fn run_ticker(shared: Weak<Shared>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.on_tick();
    }
}

impl Shared {
    fn on_tick(self: &Arc<Self>) {
        let next = {
            let mut state = self.state.lock();
            if state.busy {
                return;
            }
            let next = state.lanes.pop_next();
            if next.is_some() {
                state.busy = true;
            }
            next
        };

        if let Some((lane, task)) = next {
            let source = match lane {
                Lane::Immediate => "immediate",
                Lane::Queued => "queued",
            };
            self.execute(source, task);
        }
    }

    /// Runs a task whose `busy` flag is already set, then clears the flag
    /// once the cooldown has elapsed.
    fn execute(self: &Arc<Self>, source: &'static str, task: Task) {
        let shared = Arc::clone(self);
        let label = task.label();

        tokio::spawn(async move {
            tracing::trace!(task = label, source, "Task started");

            match shared.run(task).await {
                Ok(()) => tracing::debug!(task = label, source, "Task completed"),
                Err(e) => tracing::warn!(task = label, source, error = %e, "Task failed"),
            }

            tokio::time::sleep(shared.config.cooldown()).await;
            shared.state.lock().busy = false;
        });
    }

    /// Runs the task in its own tokio task so a panic cannot leave the
    /// dispatcher busy forever.
    async fn run(&self, task: Task) -> Result<()> {
        let (future, on_abandon) = task.into_parts();
        let mut handle = tokio::spawn(future);

        let joined = match self.config.task_timeout() {
            None => (&mut handle).await,
            Some(limit) => {
                if let Ok(joined) = tokio::time::timeout(limit, &mut handle).await {
                    joined
                } else {
                    handle.abort();
                    let millis = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    return Err(abandon(on_abandon, ProtocolError::Timeout(millis).into()));
                }
            }
        };

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(abandon(on_abandon, Error::TaskPanicked(e.to_string()))),
            Err(_) => Err(abandon(on_abandon, Error::Cancelled)),
        }
    }
}

/// Hands `error` to the task's abandon hook, if any, and returns it.
fn abandon(hook: Option<AbandonHook>, error: Error) -> Error {
    if let Some(hook) = hook {
        hook(error.clone());
    }
    error
}
