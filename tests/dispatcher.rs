// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduling behaviour of the dispatcher, driven on a paused clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sonoff_diy::{
    Dispatcher, DispatcherConfig, Error, ProtocolError, Switch, SwitchConfig, SwitchState, Task,
};
use tokio::time::Instant;

use common::{Call, ScriptedSwitch, Shared, settle};

type StartLog = Arc<Mutex<Vec<(&'static str, Instant)>>>;

fn recording_task(label: &'static str, log: &StartLog, work: Duration) -> Task {
    let log = Arc::clone(log);
    Task::new(label, async move {
        log.lock().push((label, Instant::now()));
        tokio::time::sleep(work).await;
        Ok(())
    })
}

fn switch_over(
    device: &Arc<ScriptedSwitch>,
    dispatcher: DispatcherConfig,
) -> Switch<Shared> {
    let config = SwitchConfig::new()
        .with_dispatcher(dispatcher)
        .with_poll_interval(Duration::from_secs(3600))
        .unwrap();
    Switch::new(Shared(Arc::clone(device)), config)
}

// ============================================================================
// Lanes and ticks
// ============================================================================

mod scheduling {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn immediate_lane_runs_before_queued_lane() {
        let dispatcher = Dispatcher::new(
            DispatcherConfig::new(10)
                .unwrap()
                .with_cooldown(Duration::from_millis(10)),
        );
        let log = StartLog::default();

        dispatcher.submit_queued(recording_task("queued", &log, Duration::ZERO));
        dispatcher.submit_immediate(recording_task("immediate-1", &log, Duration::ZERO));
        dispatcher.submit_immediate(recording_task("immediate-2", &log, Duration::ZERO));
        dispatcher.start();

        tokio::time::sleep(Duration::from_millis(500)).await;

        let order: Vec<_> = log.lock().iter().map(|(label, _)| *label).collect();
        assert_eq!(order, vec!["immediate-1", "immediate-2", "queued"]);
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_one_task_per_tick() {
        let dispatcher = Dispatcher::new(
            DispatcherConfig::new(10)
                .unwrap()
                .with_cooldown(Duration::from_millis(10)),
        );
        let log = StartLog::default();
        let t0 = Instant::now();

        for label in ["a", "b", "c"] {
            dispatcher.submit_immediate(recording_task(label, &log, Duration::ZERO));
        }
        dispatcher.start();

        tokio::time::sleep(Duration::from_millis(250)).await;

        let starts: Vec<_> = log.lock().iter().map(|(_, at)| *at - t0).collect();
        assert_eq!(
            starts,
            vec![
                Duration::ZERO,
                Duration::from_millis(100),
                Duration::from_millis(200)
            ]
        );
        assert_eq!(dispatcher.pending().total(), 0);
    }

    /// frequency = 2 Hz and a 100 ms cooldown: A runs on the first tick and
    /// B, submitted while A cools down, waits for the next tick at 500 ms.
    #[tokio::test(start_paused = true)]
    async fn task_submitted_during_cooldown_waits_for_next_tick() {
        let dispatcher = Dispatcher::new(
            DispatcherConfig::new(2)
                .unwrap()
                .with_cooldown(Duration::from_millis(100)),
        );
        assert_eq!(dispatcher.config().tick_interval(), Duration::from_millis(500));

        let log = StartLog::default();
        let t0 = Instant::now();

        dispatcher.submit_immediate(recording_task("a", &log, Duration::from_millis(50)));
        dispatcher.start();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(dispatcher.is_busy());
        dispatcher.submit_immediate(recording_task("b", &log, Duration::ZERO));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!dispatcher.is_busy(), "busy clears after execution plus cooldown");
        assert_eq!(dispatcher.pending().immediate, 1);

        tokio::time::sleep(Duration::from_millis(400)).await;

        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, "a");
        assert!(log[0].1 - t0 < Duration::from_millis(500));
        assert_eq!(log[1].0, "b");
        assert_eq!(log[1].1 - t0, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_task_still_releases_the_next_one() {
        let dispatcher = Dispatcher::new(
            DispatcherConfig::new(10)
                .unwrap()
                .with_cooldown(Duration::from_millis(50)),
        );
        let log = StartLog::default();

        dispatcher.submit_immediate(Task::new("fails", async {
            Err(common::unreachable())
        }));
        dispatcher.submit_queued(recording_task("after", &log, Duration::ZERO));
        dispatcher.start();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(log.lock().len(), 1);
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_now_does_not_wait_for_a_tick() {
        let dispatcher = Dispatcher::new(DispatcherConfig::new(1).unwrap());
        dispatcher.start();
        settle().await;

        let log = StartLog::default();
        let t0 = Instant::now();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(dispatcher.attempt_now(recording_task("poll", &log, Duration::ZERO)));
        settle().await;

        let log = log.lock();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1 - t0, Duration::from_millis(200));
    }
}

// ============================================================================
// Serialized device access
// ============================================================================

mod device_access {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn concurrent_sets_never_overlap_and_respect_cooldown() {
        let device = Arc::new(
            ScriptedSwitch::new(SwitchState::Off).with_latency(Duration::from_millis(50)),
        );
        let switch = switch_over(
            &device,
            DispatcherConfig::new(10)
                .unwrap()
                .with_cooldown(Duration::from_millis(100)),
        );
        switch.start();

        let (a, b, c) = tokio::join!(
            switch.request_set(SwitchState::On),
            switch.request_set(SwitchState::Off),
            switch.request_set(SwitchState::On),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        assert_eq!(device.max_in_flight(), 1);

        let calls = device.calls();
        assert_eq!(
            calls.iter().map(|(_, call)| *call).collect::<Vec<_>>(),
            vec![
                Call::Set(SwitchState::On),
                Call::Set(SwitchState::Off),
                Call::Set(SwitchState::On)
            ]
        );
        for pair in calls.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(150));
        }

        assert_eq!(switch.read_cached(), Some(SwitchState::On));
        assert_eq!(device.relay(), SwitchState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_requests() {
        let device = Arc::new(ScriptedSwitch::new(SwitchState::Off));
        let switch = switch_over(&device, DispatcherConfig::new(1).unwrap());
        switch.start();

        // The first tick fires at once with empty lanes.
        settle().await;

        let (result, ()) = tokio::join!(switch.request_set(SwitchState::On), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(switch.dispatcher().pending().immediate, 1);
            switch.stop();
        });

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(device.count(Call::Set(SwitchState::On)), 0);
        assert_eq!(switch.read_cached(), None);
        assert!(!switch.dispatcher().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_device_is_released_by_task_timeout() {
        let device = Arc::new(
            ScriptedSwitch::new(SwitchState::Off).with_latency(Duration::from_secs(30)),
        );
        let switch = switch_over(
            &device,
            DispatcherConfig::new(10)
                .unwrap()
                .with_cooldown(Duration::from_millis(100))
                .with_task_timeout(Duration::from_secs(1))
                .unwrap(),
        );
        switch.start();

        let result = switch.request_set(SwitchState::On).await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::Timeout(1000)))
        ));
        assert_eq!(switch.read_cached(), None);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!switch.dispatcher().is_busy());
    }
}
