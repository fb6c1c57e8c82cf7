// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Info query response parsing.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, ParseError};
use crate::types::SwitchState;

/// Response from `POST /zeroconf/info`.
///
/// Current firmware returns `data` as a JSON object:
///
/// ```json
/// {"seq": 5, "error": 0, "data": {"switch": "on", "startup": "off", "fwVersion": "3.6.0"}}
/// ```
///
/// Early DIY firmware sends the same object encoded as a JSON string inside
/// `data`. Both forms are accepted.
///
/// # Examples
///
/// ```
/// use sonoff_diy::response::InfoResponse;
/// use sonoff_diy::types::SwitchState;
///
/// let body = r#"{"error": 0, "data": {"switch": "off"}}"#;
/// let response = InfoResponse::parse(body).unwrap();
/// assert_eq!(response.switch_state().unwrap(), SwitchState::Off);
/// ```
#[derive(Debug, Clone)]
pub struct InfoResponse {
    seq: Option<u64>,
    error: Option<Value>,
    info: Option<DeviceInfo>,
}

#[derive(Deserialize)]
struct RawInfoResponse {
    #[serde(default)]
    seq: Option<u64>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

/// Device information carried in the `data` field of an info response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Relay state, `"on"` or `"off"`.
    #[serde(default)]
    pub switch: Option<String>,
    /// Power-on behaviour (`"on"`, `"off"` or `"stay"`).
    #[serde(default)]
    pub startup: Option<String>,
    /// Inching mode (`"on"` or `"off"`).
    #[serde(default)]
    pub pulse: Option<String>,
    /// Inching width in milliseconds.
    #[serde(default)]
    pub pulse_width: Option<u64>,
    /// Firmware version.
    #[serde(default)]
    pub fw_version: Option<String>,
    /// Device identifier.
    #[serde(default)]
    pub deviceid: Option<String>,
    /// Wi-Fi signal strength in dBm.
    #[serde(default)]
    pub signal_strength: Option<i32>,
}

impl InfoResponse {
    /// Parses a raw response body.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the body or an embedded `data` string is
    /// not valid JSON of the expected shape.
    pub fn parse(body: &str) -> Result<Self, ParseError> {
        let raw: RawInfoResponse = serde_json::from_str(body)?;
        let info = match raw.data {
            None | Some(Value::Null) => None,
            Some(Value::String(encoded)) => Some(serde_json::from_str(&encoded)?),
            Some(object) => Some(serde_json::from_value(object)?),
        };
        Ok(Self {
            seq: raw.seq,
            error: raw.error,
            info,
        })
    }

    /// Returns the device sequence number, if reported.
    #[must_use]
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    /// Returns the decoded device information, if present.
    #[must_use]
    pub fn info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    /// Returns the relay state reported by the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device reported a failure, if `data.switch`
    /// is missing, or if it holds an unknown value.
    pub fn switch_state(&self) -> Result<SwitchState, Error> {
        super::check_error(self.error.as_ref())?;

        let raw = self
            .info
            .as_ref()
            .and_then(|info| info.switch.as_deref())
            .ok_or_else(|| ParseError::MissingField("data.switch".to_string()))?;

        raw.parse::<SwitchState>().map_err(|_| {
            ParseError::InvalidValue {
                field: "data.switch".to_string(),
                message: format!("invalid switch state: {raw}"),
            }
            .into()
        })
    }
}
