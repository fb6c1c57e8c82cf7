// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP switch builder.

use std::time::Duration;

use crate::device::{Switch, SwitchConfig};
use crate::dispatcher::DispatcherConfig;
use crate::error::Error;
use crate::protocol::{HttpClient, HttpConfig};

/// Builder for HTTP-backed switches.
///
/// Created by [`Switch::http`] or [`Switch::http_config`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use sonoff_diy::Switch;
/// use sonoff_diy::dispatcher::DispatcherConfig;
///
/// # fn example() -> sonoff_diy::Result<()> {
/// let switch = Switch::http("192.168.1.40")
///     .with_device_id("1000abcdef")
///     .with_timeout(Duration::from_secs(3))
///     .with_dispatcher(DispatcherConfig::new(4)?.with_cooldown(Duration::from_millis(250)))
///     .with_poll_interval(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpSwitchBuilder {
    http: HttpConfig,
    dispatcher: DispatcherConfig,
    poll_interval: Duration,
}

impl HttpSwitchBuilder {
    pub(crate) fn new(http: HttpConfig) -> Self {
        Self {
            http,
            dispatcher: DispatcherConfig::default(),
            poll_interval: SwitchConfig::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the API port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.http = self.http.with_port(port);
        self
    }

    /// Sets the device identifier sent with every request.
    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.http = self.http.with_device_id(device_id);
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Sets the dispatcher timing.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Sets the background poll interval. Validated by [`build`](Self::build).
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the HTTP configuration collected so far.
    #[must_use]
    pub fn http_config(&self) -> &HttpConfig {
        &self.http
    }

    /// Builds the switch. No request is sent; call [`Switch::start`] to
    /// begin dispatching and polling.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty, the poll interval is zero, or the
    /// HTTP client cannot be created.
    pub fn build(self) -> Result<Switch<HttpClient>, Error> {
        let config = SwitchConfig::new()
            .with_dispatcher(self.dispatcher)
            .with_poll_interval(self.poll_interval)?;
        let client = self.http.into_client()?;
        Ok(Switch::new(client, config))
    }
}
