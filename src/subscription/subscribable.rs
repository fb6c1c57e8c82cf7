// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for types that report switch changes.

use crate::subscription::SubscriptionId;
use crate::types::SwitchState;

/// Trait for types that support switch change subscriptions.
///
/// # Examples
///
/// ```no_run
/// use sonoff_diy::Switch;
/// use sonoff_diy::subscription::Subscribable;
///
/// # async fn example() -> sonoff_diy::Result<()> {
/// let switch = Switch::http("192.168.1.40").build()?;
///
/// let sub_id = switch.on_switch_changed(|state| {
///     println!("Switch is now {state}");
/// });
///
/// switch.unsubscribe(sub_id);
/// # Ok(())
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to switch state changes detected by polling.
    ///
    /// The callback receives the new state. It is not called for changes
    /// the caller made itself through a set request.
    fn on_switch_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(SwitchState) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
