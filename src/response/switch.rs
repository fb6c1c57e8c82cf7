// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch command response parsing.

use serde::Deserialize;
use serde_json::Value;

use crate::error::DeviceError;

/// Response from `POST /zeroconf/switch`.
///
/// The device answers with something like `{"seq": 2, "error": 0}`. Only the
/// `error` field matters: its absence means the command was accepted. A body
/// that is empty or not a JSON object carries no `error` field either, so
/// [`from_body`](Self::from_body) reads it as accepted.
///
/// # Examples
///
/// ```
/// use sonoff_diy::response::SwitchResponse;
///
/// let response: SwitchResponse = serde_json::from_str(r#"{"seq": 2, "error": 0}"#).unwrap();
/// assert!(response.check().is_ok());
/// assert_eq!(response.seq(), Some(2));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchResponse {
    #[serde(default)]
    seq: Option<u64>,
    #[serde(default)]
    error: Option<Value>,
}

impl SwitchResponse {
    /// Reads a raw response body, treating anything unparseable as a body
    /// without an `error` field.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    body,
                    "Switch response is not a JSON object, assuming accepted"
                );
                Self::default()
            }
        }
    }

    /// Returns the device sequence number, if reported.
    #[must_use]
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    /// Checks whether the device accepted the command.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Rejected` if the device reported an error code.
    pub fn check(&self) -> Result<(), DeviceError> {
        super::check_error(self.error.as_ref())
    }
}
