use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default provider endpoint root
pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/geo/1.0";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`GeocodeClient`](crate::GeocodeClient).
///
/// The credential is an explicit value here rather than ambient process
/// state, and the base URL can be pointed at a substitute provider (tests
/// run against an in-process one).
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    /// OpenWeatherMap API key, sent as the `appid` query parameter
    pub api_key: String,
    /// Endpoint root; `/direct` and `/zip` are appended per lookup path
    pub base_url: String,
    /// Per-request timeout applied to the HTTP client
    pub timeout: Duration,
}

impl GeocodeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read configuration from environment variables.
    ///
    /// `OPENWEATHER_API_KEY` is required; `OPENWEATHER_GEO_URL` optionally
    /// overrides the endpoint root. A missing key fails here, at startup,
    /// instead of as a provider-side auth rejection on the first lookup.
    pub fn from_env() -> Result<Self> {
        let api_key =
            env::var("OPENWEATHER_API_KEY").context("OPENWEATHER_API_KEY must be set")?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = env::var("OPENWEATHER_GEO_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
