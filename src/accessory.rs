// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binding between a [`Switch`] and a home-automation host.
//!
//! A host discovers the accessory through [`registration`], constructs it
//! from the JSON block of its configuration file, enumerates its services,
//! and wires a get handler and a set handler to the `On` characteristic:
//!
//! ```no_run
//! use sonoff_diy::accessory::{self, AccessoryConfig};
//!
//! # async fn example() -> sonoff_diy::Result<()> {
//! let config = AccessoryConfig::from_json(r#"{"name": "Desk lamp", "ip": "192.168.1.40"}"#)?;
//! let lamp = (accessory::registration().constructor)(config)?;
//! lamp.start();
//!
//! let _on = lamp.handle_get();
//! lamp.handle_set(true, |error| {
//!     if let Some(error) = error {
//!         eprintln!("set failed: {error}");
//!     }
//! })
//! .await;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::device::Switch;
use crate::dispatcher::DispatcherConfig;
use crate::error::{Error, ParseError, Result, ValueError};
use crate::protocol::{HttpClient, HttpConfig};
use crate::subscription::{Subscribable, SubscriptionId};

/// Key under which the accessory registers with the host.
pub const ACCESSORY_NAME: &str = "SonoffDiySwitch";

/// Manufacturer reported in the accessory information service.
const MANUFACTURER: &str = "Sonoff";
/// Model reported in the accessory information service.
const MODEL: &str = "DIY mode switch";

/// Accessory settings as found in the host configuration file.
///
/// Durations are given in milliseconds. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryConfig {
    /// Display name of the accessory.
    pub name: String,
    /// Device address.
    pub ip: String,
    /// API port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Device identifier sent with requests.
    #[serde(default)]
    pub device_id: Option<String>,
    /// Dispatcher tick frequency in Hz.
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    /// Cooldown after each device command, in ms.
    #[serde(default = "default_cooldown")]
    pub cooldown: u64,
    /// Background poll interval, in ms.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// HTTP request timeout, in ms.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_port() -> u16 {
    HttpConfig::DEFAULT_PORT
}

fn default_frequency() -> u32 {
    DispatcherConfig::DEFAULT_FREQUENCY_HZ
}

fn default_cooldown() -> u64 {
    100
}

fn default_poll_interval() -> u64 {
    5_000
}

fn default_timeout() -> u64 {
    10_000
}

impl AccessoryConfig {
    /// Parses the accessory block of a host configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the JSON is malformed or misses `name`
    /// or `ip`.
    pub fn from_json(json: &str) -> std::result::Result<Self, ParseError> {
        Ok(serde_json::from_str(json)?)
    }

    fn http_config(&self) -> std::result::Result<HttpConfig, ValueError> {
        if self.timeout == 0 {
            return Err(ValueError::ZeroDuration("timeout"));
        }
        let config = HttpConfig::new(self.ip.clone())
            .with_port(self.port)
            .with_timeout(Duration::from_millis(self.timeout));
        Ok(match &self.device_id {
            Some(id) => config.with_device_id(id.clone()),
            None => config,
        })
    }

    fn dispatcher_config(&self) -> std::result::Result<DispatcherConfig, ValueError> {
        Ok(DispatcherConfig::new(self.frequency)?
            .with_cooldown(Duration::from_millis(self.cooldown)))
    }
}

/// Constructor signature exposed to the host.
pub type AccessoryConstructor = fn(AccessoryConfig) -> Result<SwitchAccessory>;

/// What the host needs to register the accessory type.
#[derive(Debug, Clone, Copy)]
pub struct AccessoryRegistration {
    /// Human-readable key.
    pub key: &'static str,
    /// Builds an accessory from its configuration.
    pub constructor: AccessoryConstructor,
}

/// Returns the registration entry for this accessory type.
#[must_use]
pub fn registration() -> AccessoryRegistration {
    AccessoryRegistration {
        key: ACCESSORY_NAME,
        constructor: SwitchAccessory::from_config,
    }
}

/// Kind of service exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Static accessory metadata.
    AccessoryInformation,
    /// The on/off switch itself.
    Switch,
}

/// A characteristic exposed by a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Characteristic {
    /// Manufacturer name.
    Manufacturer(String),
    /// Model name.
    Model(String),
    /// Serial number (the device id when configured).
    SerialNumber(String),
    /// Readable and writable power state.
    On,
}

/// A service and its characteristics, as enumerated for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Service kind.
    pub kind: ServiceKind,
    /// Display name.
    pub name: String,
    /// Exposed characteristics.
    pub characteristics: Vec<Characteristic>,
}

/// A switch accessory as seen by the host.
#[derive(Debug)]
pub struct SwitchAccessory {
    config: AccessoryConfig,
    switch: Switch<HttpClient>,
}

impl SwitchAccessory {
    /// Builds the accessory from its configuration. No request is sent.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration holds an invalid frequency, a zero
    /// timeout or poll interval, or an empty address.
    pub fn from_config(config: AccessoryConfig) -> Result<Self> {
        let switch = Switch::http_config(config.http_config()?)
            .with_dispatcher(config.dispatcher_config()?)
            .with_poll_interval(Duration::from_millis(config.poll_interval))
            .build()?;

        tracing::info!(name = %config.name, ip = %config.ip, "Created switch accessory");

        Ok(Self { config, switch })
    }

    /// Returns the accessory display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the underlying switch.
    #[must_use]
    pub fn switch(&self) -> &Switch<HttpClient> {
        &self.switch
    }

    /// Starts dispatching and background polling.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn start(&self) {
        self.switch.start();
    }

    /// Stops dispatching and background polling.
    pub fn stop(&self) {
        self.switch.stop();
    }

    /// Enumerates the services exposed to the host.
    #[must_use]
    pub fn services(&self) -> Vec<ServiceDescriptor> {
        let serial = self
            .config
            .device_id
            .clone()
            .unwrap_or_else(|| self.config.ip.clone());

        vec![
            ServiceDescriptor {
                kind: ServiceKind::AccessoryInformation,
                name: self.config.name.clone(),
                characteristics: vec![
                    Characteristic::Manufacturer(MANUFACTURER.to_string()),
                    Characteristic::Model(MODEL.to_string()),
                    Characteristic::SerialNumber(serial),
                ],
            },
            ServiceDescriptor {
                kind: ServiceKind::Switch,
                name: self.config.name.clone(),
                characteristics: vec![Characteristic::On],
            },
        ]
    }

    /// Get handler for `On`: answers from the cache, `false` while unknown.
    #[must_use]
    pub fn handle_get(&self) -> bool {
        self.switch.read_cached().is_some_and(|state| state.is_on())
    }

    /// Set handler for `On`: calls `callback` with `None` on success or with
    /// the error on failure.
    pub async fn handle_set<F>(&self, value: bool, callback: F)
    where
        F: FnOnce(Option<Error>),
    {
        match self.switch.request_set(value).await {
            Ok(()) => callback(None),
            Err(e) => {
                tracing::warn!(name = %self.config.name, value, error = %e, "Set request failed");
                callback(Some(e));
            }
        }
    }

    /// Forwards changes detected by polling to the host.
    pub fn on_update<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.switch.on_switch_changed(move |state| callback(state.is_on()))
    }
}
