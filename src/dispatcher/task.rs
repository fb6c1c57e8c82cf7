// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Units of dispatched work and the lanes that hold them.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::{Error, Result};

pub(crate) type BoxedFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;
pub(crate) type AbandonHook = Box<dyn FnOnce(Error) + Send + 'static>;

/// A unit of work run by the dispatcher.
///
/// A task resolves to success or failure only. Callers that need a result
/// capture their own channel in the future and report through it before
/// the task completes.
///
/// # Examples
///
/// ```
/// use sonoff_diy::dispatcher::Task;
///
/// let task = Task::new("noop", async { Ok(()) });
/// assert_eq!(task.label(), "noop");
/// ```
pub struct Task {
    label: &'static str,
    future: BoxedFuture,
    on_abandon: Option<AbandonHook>,
}

impl Task {
    /// Wraps `future` into a task. The label only appears in logs.
    pub fn new<F>(label: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            label,
            future: Box::pin(future),
            on_abandon: None,
        }
    }

    /// Registers `hook` to receive the error when the dispatcher gives up
    /// on the task after starting it: the task timeout fired or the task
    /// panicked. Not called for tasks dropped from a lane before starting.
    #[must_use]
    pub fn on_abandon<H>(mut self, hook: H) -> Self
    where
        H: FnOnce(Error) + Send + 'static,
    {
        self.on_abandon = Some(Box::new(hook));
        self
    }

    /// Returns the task label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub(crate) fn into_parts(self) -> (BoxedFuture, Option<AbandonHook>) {
        (self.future, self.on_abandon)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Priority class of pending work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Interactive commands. Always served first.
    Immediate,
    /// Background work, served when the immediate lane is empty.
    Queued,
}

/// Number of tasks waiting in each lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingTasks {
    /// Tasks in the immediate lane.
    pub immediate: usize,
    /// Tasks in the queued lane.
    pub queued: usize,
}

impl PendingTasks {
    /// Returns the total number of waiting tasks.
    #[must_use]
    pub fn total(&self) -> usize {
        self.immediate + self.queued
    }
}

/// The two FIFO lanes.
#[derive(Debug, Default)]
pub(crate) struct Lanes {
    immediate: VecDeque<Task>,
    queued: VecDeque<Task>,
}

impl Lanes {
    pub(crate) fn push(&mut self, lane: Lane, task: Task) {
        match lane {
            Lane::Immediate => self.immediate.push_back(task),
            Lane::Queued => self.queued.push_back(task),
        }
    }

    /// Pops the next task, immediate lane first.
    pub(crate) fn pop_next(&mut self) -> Option<(Lane, Task)> {
        if let Some(task) = self.immediate.pop_front() {
            return Some((Lane::Immediate, task));
        }
        self.queued.pop_front().map(|task| (Lane::Queued, task))
    }

    pub(crate) fn pending(&self) -> PendingTasks {
        PendingTasks {
            immediate: self.immediate.len(),
            queued: self.queued.len(),
        }
    }

    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.immediate.len() + self.queued.len();
        self.immediate.clear();
        self.queued.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(label: &'static str) -> Task {
        Task::new(label, async { Ok(()) })
    }

    #[test]
    fn immediate_lane_is_served_first() {
        let mut lanes = Lanes::default();
        lanes.push(Lane::Queued, task("q1"));
        lanes.push(Lane::Immediate, task("i1"));
        lanes.push(Lane::Queued, task("q2"));
        lanes.push(Lane::Immediate, task("i2"));

        let order: Vec<_> = std::iter::from_fn(|| lanes.pop_next())
            .map(|(lane, task)| (lane, task.label()))
            .collect();

        assert_eq!(
            order,
            vec![
                (Lane::Immediate, "i1"),
                (Lane::Immediate, "i2"),
                (Lane::Queued, "q1"),
                (Lane::Queued, "q2"),
            ]
        );
    }

    #[test]
    fn pending_and_clear() {
        let mut lanes = Lanes::default();
        assert_eq!(lanes.pending().total(), 0);

        lanes.push(Lane::Immediate, task("a"));
        lanes.push(Lane::Queued, task("b"));
        lanes.push(Lane::Queued, task("c"));
        assert_eq!(
            lanes.pending(),
            PendingTasks {
                immediate: 1,
                queued: 2
            }
        );

        assert_eq!(lanes.clear(), 3);
        assert!(lanes.pop_next().is_none());
    }

    #[test]
    fn task_debug_shows_label() {
        let rendered = format!("{:?}", task("poll"));
        assert!(rendered.contains("poll"));
    }
}
