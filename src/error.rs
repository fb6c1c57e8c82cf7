// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `sonoff_diy` library.
//!
//! Failures fall into three layers: value validation, transport (the HTTP
//! call did not complete), and device-reported failures (the device answered
//! with a non-zero `error` code). Parsing failures sit between the last two.
//!
//! All error types are `Clone`. A failed command is handed back to the caller
//! that requested it and is also logged by the dispatcher that ran it.

use std::sync::Arc;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a device response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The device answered but reported a failure.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// The command was dropped before it completed.
    ///
    /// Happens when the dispatcher is stopped while the command is still
    /// waiting in a lane.
    #[error("command was cancelled before completion")]
    Cancelled,

    /// A dispatched task panicked.
    #[error("task panicked: {0}")]
    TaskPanicked(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u32,
        /// Maximum allowed value.
        max: u32,
        /// The actual value that was provided.
        actual: u32,
    },

    /// An invalid switch state string was provided.
    #[error("invalid switch state: {0}")]
    InvalidSwitchState(String),

    /// A duration that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Errors related to HTTP communication with the device.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[source] Arc<reqwest::Error>),

    /// Connection to the device failed or returned a non-success status.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ProtocolError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Arc::new(err))
    }
}

/// Errors related to parsing device responses.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

/// Errors reported by the device itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The device answered with a non-success `error` code.
    #[error("device rejected the request with error {code}")]
    Rejected {
        /// The raw `error` value from the response body.
        code: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
