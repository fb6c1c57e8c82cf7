// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `sonoff_diy` - control Sonoff relays running in DIY mode.
//!
//! DIY-mode firmware exposes a small JSON API over HTTP. The device copes
//! badly with bursts of requests, so every call made by this library goes
//! through a [`Dispatcher`] that runs at most one command at a time, starts
//! commands only on a fixed tick and enforces a cooldown after each one.
//!
//! # Features
//!
//! - **Set requests**: [`Switch::request_set`] goes through the immediate
//!   lane and resolves with the device's answer
//! - **Cached reads**: [`Switch::read_cached`] never touches the network
//! - **Background polling**: the [`StateTracker`] reconciles the cache with
//!   the device and notifies subscribers on change, skipping polls while a
//!   command is in flight
//! - **Host binding**: [`accessory`] exposes the switch to a home-automation
//!   host as an accessory with an `On` characteristic
//!
//! # Quick Start
//!
//! ```no_run
//! use sonoff_diy::{Subscribable, Switch, SwitchState};
//!
//! #[tokio::main]
//! async fn main() -> sonoff_diy::Result<()> {
//!     let switch = Switch::http("192.168.1.40").build()?;
//!     switch.start();
//!
//!     switch.on_switch_changed(|state| {
//!         println!("switch is now {state}");
//!     });
//!
//!     switch.request_set(SwitchState::On).await?;
//!     println!("cached: {:?}", switch.read_cached());
//!
//!     switch.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Custom transports
//!
//! [`Switch::new`] accepts any [`SwitchProtocol`] implementation, which is
//! how the dispatcher and tracker are exercised without a device.

#[cfg(feature = "http")]
pub mod accessory;
mod device;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod response;
pub mod state;
pub mod subscription;
pub mod tracker;
pub mod types;

#[cfg(feature = "http")]
pub use device::HttpSwitchBuilder;
pub use device::{Switch, SwitchConfig};
pub use dispatcher::{Dispatcher, DispatcherConfig, Lane, PendingTasks, Task};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
#[cfg(feature = "http")]
pub use protocol::{HttpClient, HttpConfig};
pub use protocol::SwitchProtocol;
pub use response::{DeviceInfo, InfoResponse, SwitchResponse};
pub use state::SwitchCache;
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use tracker::StateTracker;
pub use types::SwitchState;
