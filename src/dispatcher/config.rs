// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dispatcher timing configuration.

use std::time::Duration;

use crate::error::ValueError;

/// Timing parameters of a [`Dispatcher`](super::Dispatcher).
///
/// Two limits apply to the device: tasks start only on a tick (at most
/// `frequency_hz` per second) and never sooner than `cooldown` after the
/// previous task finished.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sonoff_diy::dispatcher::DispatcherConfig;
///
/// let config = DispatcherConfig::new(3)?
///     .with_cooldown(Duration::from_millis(250));
///
/// // ceil(1000 / 3)
/// assert_eq!(config.tick_interval(), Duration::from_millis(334));
/// # Ok::<(), sonoff_diy::error::ValueError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    frequency_hz: u32,
    cooldown: Duration,
    task_timeout: Option<Duration>,
}

impl DispatcherConfig {
    /// Lowest accepted tick frequency.
    pub const MIN_FREQUENCY_HZ: u32 = 1;
    /// Highest accepted tick frequency (one tick per millisecond).
    pub const MAX_FREQUENCY_HZ: u32 = 1000;
    /// Default tick frequency.
    pub const DEFAULT_FREQUENCY_HZ: u32 = 2;
    /// Default cooldown after each task.
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(100);

    /// Creates a configuration ticking `frequency_hz` times per second.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the frequency is outside `1..=1000`.
    pub fn new(frequency_hz: u32) -> Result<Self, ValueError> {
        if !(Self::MIN_FREQUENCY_HZ..=Self::MAX_FREQUENCY_HZ).contains(&frequency_hz) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN_FREQUENCY_HZ,
                max: Self::MAX_FREQUENCY_HZ,
                actual: frequency_hz,
            });
        }
        Ok(Self {
            frequency_hz,
            cooldown: Self::DEFAULT_COOLDOWN,
            task_timeout: None,
        })
    }

    /// Sets the idle period enforced after every task.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Bounds how long a single task may run.
    ///
    /// Without it a stalled task keeps the dispatcher busy until the task
    /// itself gives up. A task that exceeds the bound is aborted and treated
    /// as failed; the cooldown still applies afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::ZeroDuration` for a zero timeout.
    pub fn with_task_timeout(mut self, timeout: Duration) -> Result<Self, ValueError> {
        if timeout.is_zero() {
            return Err(ValueError::ZeroDuration("task timeout"));
        }
        self.task_timeout = Some(timeout);
        Ok(self)
    }

    /// Returns the tick frequency in Hz.
    #[must_use]
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Returns the scheduling tick period, `ceil(1000 / frequency_hz)` ms.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(u64::from(1000_u32.div_ceil(self.frequency_hz)))
    }

    /// Returns the cooldown.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns the task timeout, if any.
    #[must_use]
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            frequency_hz: Self::DEFAULT_FREQUENCY_HZ,
            cooldown: Self::DEFAULT_COOLDOWN,
            task_timeout: None,
        }
    }
}
