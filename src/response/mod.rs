// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for the DIY-mode JSON API.
//!
//! Every response carries an optional `error` field. The device uses `0` for
//! success; firmware variants also omit it or send `null`. Anything else is
//! a device-reported failure.

mod info;
mod switch;

pub use info::{DeviceInfo, InfoResponse};
pub use switch::SwitchResponse;

use serde_json::Value;

use crate::error::DeviceError;

/// Interprets the `error` field shared by all device responses.
///
/// # Errors
///
/// Returns `DeviceError::Rejected` for any value other than absent, `null`
/// or a number equal to zero (`0`, `0.0`).
pub(crate) fn check_error(error: Option<&Value>) -> Result<(), DeviceError> {
    match error {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|code| code.abs() < f64::EPSILON) => {
            Ok(())
        }
        Some(Value::String(s)) => Err(DeviceError::Rejected { code: s.clone() }),
        Some(other) => Err(DeviceError::Rejected {
            code: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_null_and_zero_are_success() {
        assert!(check_error(None).is_ok());
        assert!(check_error(Some(&Value::Null)).is_ok());
        assert!(check_error(Some(&serde_json::json!(0))).is_ok());
        assert!(check_error(Some(&serde_json::json!(0.0))).is_ok());
    }

    #[test]
    fn other_codes_are_rejected() {
        let err = check_error(Some(&serde_json::json!(400))).unwrap_err();
        assert_eq!(
            err,
            DeviceError::Rejected {
                code: "400".to_string()
            }
        );

        let err = check_error(Some(&serde_json::json!(0.5))).unwrap_err();
        assert_eq!(
            err,
            DeviceError::Rejected {
                code: "0.5".to_string()
            }
        );

        let err = check_error(Some(&serde_json::json!("busy"))).unwrap_err();
        assert_eq!(
            err,
            DeviceError::Rejected {
                code: "busy".to_string()
            }
        );
    }
}
