// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol implementations for communicating with the switch.
//!
//! The scheduling core only depends on the [`SwitchProtocol`] trait. The
//! bundled [`HttpClient`] implements it against the DIY-mode REST API;
//! tests and alternative transports can provide their own implementation.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig};

use std::future::Future;

use crate::error::Result;
use crate::types::SwitchState;

/// Trait for transports that can drive a single on/off device.
///
/// Both operations return `Send` futures so that dispatcher tasks built on
/// them can run on a multi-threaded tokio runtime.
///
/// # Examples
///
/// ```
/// use sonoff_diy::protocol::SwitchProtocol;
/// use sonoff_diy::types::SwitchState;
///
/// struct AlwaysOn;
///
/// impl SwitchProtocol for AlwaysOn {
///     async fn set_switch(&self, _state: SwitchState) -> sonoff_diy::Result<()> {
///         Ok(())
///     }
///
///     async fn get_switch(&self) -> sonoff_diy::Result<SwitchState> {
///         Ok(SwitchState::On)
///     }
/// }
/// ```
pub trait SwitchProtocol: Send + Sync + 'static {
    /// Drives the relay to `state`.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the device is unreachable, or a device
    /// error if it rejected the command.
    fn set_switch(&self, state: SwitchState) -> impl Future<Output = Result<()>> + Send;

    /// Reads the current relay state.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the device is unreachable, a parse error
    /// if the answer is malformed, or a device error if it reported a failure.
    fn get_switch(&self) -> impl Future<Output = Result<SwitchState>> + Send;
}
