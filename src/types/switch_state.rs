// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay state of a DIY-mode switch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Represents the relay state of the switch.
///
/// The device speaks lowercase `"on"` / `"off"` on the wire, while home
/// automation hosts usually speak `bool`. Both conversions are provided.
///
/// # Examples
///
/// ```
/// use sonoff_diy::types::SwitchState;
///
/// assert_eq!(SwitchState::On.as_str(), "on");
/// assert_eq!(SwitchState::from(false), SwitchState::Off);
/// assert!("ON".parse::<SwitchState>().unwrap().is_on());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    /// Relay is open.
    Off,
    /// Relay is closed.
    On,
}

impl SwitchState {
    /// Returns the wire representation used by the device API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Returns `true` if the relay is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    /// Returns the opposite state.
    #[must_use]
    pub const fn inverted(&self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SwitchState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "0" | "false" => Ok(Self::Off),
            "on" | "1" | "true" => Ok(Self::On),
            _ => Err(ValueError::InvalidSwitchState(s.to_string())),
        }
    }
}

impl From<bool> for SwitchState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<SwitchState> for bool {
    fn from(state: SwitchState) -> Self {
        state.is_on()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_state_as_str() {
        assert_eq!(SwitchState::Off.as_str(), "off");
        assert_eq!(SwitchState::On.as_str(), "on");
    }

    #[test]
    fn switch_state_from_str() {
        assert_eq!("ON".parse::<SwitchState>().unwrap(), SwitchState::On);
        assert_eq!("off".parse::<SwitchState>().unwrap(), SwitchState::Off);
        assert_eq!("1".parse::<SwitchState>().unwrap(), SwitchState::On);
        assert_eq!("0".parse::<SwitchState>().unwrap(), SwitchState::Off);
        assert_eq!("true".parse::<SwitchState>().unwrap(), SwitchState::On);
        assert_eq!("False".parse::<SwitchState>().unwrap(), SwitchState::Off);
    }

    #[test]
    fn switch_state_from_str_invalid() {
        let result = "toggle".parse::<SwitchState>();
        assert!(matches!(
            result.unwrap_err(),
            ValueError::InvalidSwitchState(_)
        ));
    }

    #[test]
    fn switch_state_bool_conversions() {
        assert_eq!(SwitchState::from(true), SwitchState::On);
        assert_eq!(SwitchState::from(false), SwitchState::Off);
        assert!(bool::from(SwitchState::On));
        assert!(!bool::from(SwitchState::Off));
    }

    #[test]
    fn switch_state_inverted() {
        assert_eq!(SwitchState::On.inverted(), SwitchState::Off);
        assert_eq!(SwitchState::Off.inverted(), SwitchState::On);
    }

    #[test]
    fn switch_state_serde_uses_wire_strings() {
        assert_eq!(serde_json::to_string(&SwitchState::On).unwrap(), "\"on\"");
        let state: SwitchState = serde_json::from_str("\"off\"").unwrap();
        assert_eq!(state, SwitchState::Off);
    }
}
