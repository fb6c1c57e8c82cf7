// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP protocol implementation for DIY-mode switches.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::SwitchProtocol;
use crate::response::{InfoResponse, SwitchResponse};
use crate::types::SwitchState;

// ============================================================================
// HttpConfig - Connection parameters
// ============================================================================

/// Configuration for an HTTP DIY-mode device.
///
/// # Examples
///
/// ```
/// use sonoff_diy::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.40")
///     .with_port(8081)
///     .with_device_id("1000abcdef")
///     .with_timeout(Duration::from_secs(3));
///
/// assert_eq!(config.base_url(), "http://192.168.1.40:8081");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    device_id: Option<String>,
    timeout: Duration,
}

impl HttpConfig {
    /// Default DIY-mode API port.
    pub const DEFAULT_PORT: u16 = 8081;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new HTTP configuration for the specified host.
    ///
    /// # Arguments
    ///
    /// * `host` - The hostname or IP address of the device
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            device_id: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the device identifier sent as `deviceid` in request bodies.
    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Sets the request timeout.
    ///
    /// This bounds every device call, and with it how long a single
    /// dispatcher task can hold the device.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the device identifier if set.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    ///
    /// A host that already carries a scheme (`http://...`) is used as is,
    /// without appending the port.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            return self.host.trim_end_matches('/').to_string();
        }
        format!("http://{}:{}", self.host, self.port)
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_client(self) -> std::result::Result<HttpClient, ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress("host is required".to_string()));
        }

        let base_url = self.base_url();
        let client = Client::builder().timeout(self.timeout).build()?;

        Ok(HttpClient {
            base_url,
            client,
            device_id: self.device_id,
            timeout: self.timeout,
        })
    }
}

// ============================================================================
// HttpClient - DIY-mode REST client
// ============================================================================

/// HTTP client for the DIY-mode `/zeroconf/*` endpoints.
///
/// # Examples
///
/// ```no_run
/// use sonoff_diy::protocol::{HttpConfig, SwitchProtocol};
/// use sonoff_diy::types::SwitchState;
///
/// # async fn example() -> sonoff_diy::Result<()> {
/// let client = HttpConfig::new("192.168.1.40").into_client()?;
/// client.set_switch(SwitchState::On).await?;
/// assert!(client.get_switch().await?.is_on());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
    device_id: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct RequestBody<'a, D: Serialize> {
    #[serde(rename = "deviceid", skip_serializing_if = "Option::is_none")]
    device_id: Option<&'a str>,
    data: D,
}

#[derive(Debug, Serialize)]
struct SwitchData {
    switch: SwitchState,
}

#[derive(Debug, Serialize)]
struct EmptyData {}

impl HttpClient {
    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/zeroconf/{path}", self.base_url)
    }

    async fn post<D: Serialize>(&self, path: &str, data: D) -> Result<String> {
        let url = self.endpoint(path);
        let body = RequestBody {
            device_id: self.device_id.as_deref(),
            data,
        };

        tracing::debug!(url = %url, "Sending HTTP request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            ))
            .into());
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        tracing::debug!(body = %text, "Received HTTP response");

        Ok(text)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            ProtocolError::Timeout(millis).into()
        } else {
            ProtocolError::from(err).into()
        }
    }
}

impl SwitchProtocol for HttpClient {
    async fn set_switch(&self, state: SwitchState) -> Result<()> {
        let body = self.post("switch", SwitchData { switch: state }).await?;
        SwitchResponse::from_body(&body).check()?;
        Ok(())
    }

    async fn get_switch(&self) -> Result<SwitchState> {
        let body = self.post("info", EmptyData {}).await?;
        InfoResponse::parse(&body)?.switch_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_default_values() {
        let config = HttpConfig::new("192.168.1.40");
        assert_eq!(config.host(), "192.168.1.40");
        assert_eq!(config.port(), 8081);
        assert!(config.device_id().is_none());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn http_config_builder_chain() {
        let config = HttpConfig::new("192.168.1.40")
            .with_port(8080)
            .with_device_id("1000abcdef")
            .with_timeout(Duration::from_secs(2));

        assert_eq!(config.port(), 8080);
        assert_eq!(config.device_id(), Some("1000abcdef"));
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn http_config_base_url() {
        let config = HttpConfig::new("192.168.1.40");
        assert_eq!(config.base_url(), "http://192.168.1.40:8081");
    }

    #[test]
    fn http_config_base_url_with_scheme() {
        let config = HttpConfig::new("http://127.0.0.1:34567/");
        assert_eq!(config.base_url(), "http://127.0.0.1:34567");
    }

    #[test]
    fn http_config_into_client() {
        let client = HttpConfig::new("192.168.1.40").into_client().unwrap();
        assert_eq!(client.base_url(), "http://192.168.1.40:8081");
        assert_eq!(client.endpoint("info"), "http://192.168.1.40:8081/zeroconf/info");
    }

    #[test]
    fn http_config_rejects_empty_host() {
        let result = HttpConfig::new("  ").into_client();
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[test]
    fn switch_body_shape() {
        let body = RequestBody {
            device_id: None,
            data: SwitchData {
                switch: SwitchState::On,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"data": {"switch": "on"}})
        );
    }

    #[test]
    fn info_body_shape_with_device_id() {
        let body = RequestBody {
            device_id: Some("1000abcdef"),
            data: EmptyData {},
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"deviceid": "1000abcdef", "data": {}})
        );
    }
}
