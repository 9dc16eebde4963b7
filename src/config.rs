//! Payment configuration.
//!
//! Configuration is always passed explicitly to the service factory.
//! `PaymentConfig::from_env` is a convenience for binaries and reads:
//! - `PAYMENT_MODE` — `mock`, `sandbox` or `production` (default: `"mock"`)
//! - `MOCK_SUCCESS_RATE` — probability of capture (default: `0.8`)
//! - `MOCK_REQUIRE_3DS_RATE` — probability of a 3-D Secure challenge (default: `0.3`)
//! - `MOCK_API_DELAY_MS` — latency of request-style calls (default: `1000`)
//! - `MOCK_WEBHOOK_DELAY_MS` — delay before the simulated webhook (default: `3000`)
//! - `MOCK_DEBUG` — log lifecycle events at `info` (default: `false`)
//! - `ALLSECURE_MERCHANT_ID`, `ALLSECURE_API_URL`, `ALLSECURE_WIDGET_URL`,
//!   `ALLSECURE_API_KEY` — reserved for the real gateway

use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    Mock,
    Sandbox,
    Production,
}

impl FromStr for PaymentMode {
    type Err = PaymentError;

    fn from_str(mode: &str) -> Result<Self> {
        match mode {
            "mock" => Ok(Self::Mock),
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(PaymentError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mock => "mock",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        })
    }
}

/// Tunables of the mock payment simulator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub success_rate: f64,
    pub require_3ds_rate: f64,
    pub api_delay_ms: u64,
    pub webhook_delay_ms: u64,
    pub debug_mode: bool,
}

impl MockConfig {
    pub fn api_delay(&self) -> Duration {
        Duration::from_millis(self.api_delay_ms)
    }

    pub fn webhook_delay(&self) -> Duration {
        Duration::from_millis(self.webhook_delay_ms)
    }

    /// Rejects probabilities outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("success_rate", self.success_rate),
            ("require_3ds_rate", self.require_3ds_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(PaymentError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            success_rate: 0.8,
            require_3ds_rate: 0.3,
            api_delay_ms: 1_000,
            webhook_delay_ms: 3_000,
            debug_mode: false,
        }
    }
}

/// Credentials of the real AllSecure gateway. Not used yet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GatewayConfig {
    pub merchant_id: String,
    pub api_url: String,
    pub widget_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentConfig {
    /// Raw mode so unrecognised values can be reported by name.
    pub mode: Option<String>,
    pub mock: Option<MockConfig>,
    pub gateway: Option<GatewayConfig>,
}

impl PaymentConfig {
    /// Mock mode with the given tunables.
    pub fn mock(mock: MockConfig) -> Self {
        Self {
            mode: Some(PaymentMode::Mock.to_string()),
            mock: Some(mock),
            gateway: None,
        }
    }

    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MockConfig::default();
        let parse_or = |key: &str, default: f64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let parse_ms_or = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let mock = MockConfig {
            success_rate: parse_or("MOCK_SUCCESS_RATE", defaults.success_rate),
            require_3ds_rate: parse_or("MOCK_REQUIRE_3DS_RATE", defaults.require_3ds_rate),
            api_delay_ms: parse_ms_or("MOCK_API_DELAY_MS", defaults.api_delay_ms),
            webhook_delay_ms: parse_ms_or("MOCK_WEBHOOK_DELAY_MS", defaults.webhook_delay_ms),
            debug_mode: lookup("MOCK_DEBUG")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(defaults.debug_mode),
        };

        let gateway_keys = [
            "ALLSECURE_MERCHANT_ID",
            "ALLSECURE_API_URL",
            "ALLSECURE_WIDGET_URL",
            "ALLSECURE_API_KEY",
        ];
        let gateway = gateway_keys
            .iter()
            .any(|key| lookup(key).is_some())
            .then(|| GatewayConfig {
                merchant_id: lookup("ALLSECURE_MERCHANT_ID").unwrap_or_default(),
                api_url: lookup("ALLSECURE_API_URL").unwrap_or_default(),
                widget_url: lookup("ALLSECURE_WIDGET_URL").unwrap_or_default(),
                api_key: lookup("ALLSECURE_API_KEY").unwrap_or_default(),
            });

        Self {
            mode: Some(lookup("PAYMENT_MODE").unwrap_or_else(|| PaymentMode::Mock.to_string())),
            mock: Some(mock),
            gateway,
        }
    }
}
