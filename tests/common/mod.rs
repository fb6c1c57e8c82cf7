// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory switch shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sonoff_diy::error::{ProtocolError, Result};
use sonoff_diy::{Error, SwitchProtocol, SwitchState};
use tokio::time::Instant;

/// A call observed by [`ScriptedSwitch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Set(SwitchState),
    Get,
}

/// In-memory device with scripted answers and a call log.
///
/// Each `get_switch` pops the next scripted read; once the script is empty
/// the relay state is returned. Each `set_switch` pops the next scripted set
/// result, defaulting to success.
pub struct ScriptedSwitch {
    relay: Mutex<SwitchState>,
    reads: Mutex<VecDeque<Result<SwitchState>>>,
    sets: Mutex<VecDeque<Result<()>>>,
    latency: Duration,
    calls: Mutex<Vec<(Instant, Call)>>,
    in_flight: Mutex<usize>,
    max_in_flight: Mutex<usize>,
}

impl ScriptedSwitch {
    pub fn new(relay: SwitchState) -> Self {
        Self {
            relay: Mutex::new(relay),
            reads: Mutex::new(VecDeque::new()),
            sets: Mutex::new(VecDeque::new()),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: Mutex::new(0),
            max_in_flight: Mutex::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_reads(self, reads: impl IntoIterator<Item = SwitchState>) -> Self {
        self.reads.lock().extend(reads.into_iter().map(Ok));
        self
    }

    pub fn fail_next_set(&self, error: Error) {
        self.sets.lock().push_back(Err(error));
    }

    pub fn fail_next_read(&self, error: Error) {
        self.reads.lock().push_back(Err(error));
    }

    pub fn relay(&self) -> SwitchState {
        *self.relay.lock()
    }

    pub fn calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().iter().filter(|(_, c)| *c == call).count()
    }

    pub fn reads(&self) -> usize {
        self.count(Call::Get)
    }

    pub fn max_in_flight(&self) -> usize {
        *self.max_in_flight.lock()
    }

    async fn enter(&self, call: Call) {
        self.calls.lock().push((Instant::now(), call));
        {
            let mut in_flight = self.in_flight.lock();
            *in_flight += 1;
            let mut max = self.max_in_flight.lock();
            *max = (*max).max(*in_flight);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn leave(&self) {
        *self.in_flight.lock() -= 1;
    }
}

impl SwitchProtocol for ScriptedSwitch {
    async fn set_switch(&self, state: SwitchState) -> Result<()> {
        self.enter(Call::Set(state)).await;
        let result = self.sets.lock().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            *self.relay.lock() = state;
        }
        self.leave();
        result
    }

    async fn get_switch(&self) -> Result<SwitchState> {
        self.enter(Call::Get).await;
        let scripted = self.reads.lock().pop_front();
        let result = scripted.unwrap_or_else(|| Ok(*self.relay.lock()));
        self.leave();
        result
    }
}

/// Forwards to a shared [`ScriptedSwitch`] so tests keep a handle on it.
pub struct Shared(pub Arc<ScriptedSwitch>);

impl SwitchProtocol for Shared {
    async fn set_switch(&self, state: SwitchState) -> Result<()> {
        self.0.set_switch(state).await
    }

    async fn get_switch(&self) -> Result<SwitchState> {
        self.0.get_switch().await
    }
}

pub fn unreachable() -> Error {
    ProtocolError::ConnectionFailed("no route to host".to_string()).into()
}

/// Lets spawned tasks run without advancing the paused clock.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
