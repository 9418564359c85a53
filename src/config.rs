use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::error::CubicError;
use crate::validate;

pub const TOKEN_VAR: &str = "CUBIC_TOKEN";
pub const APP_ID_VAR: &str = "CUBIC_APP_ID";
pub const BASE_URL_VAR: &str = "CUBIC_BASE_URL";
pub const TIMEOUT_VAR: &str = "CUBIC_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and endpoint for a cubic client. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    token: String,
    app_id: String,
    base_url: String,
    timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        token: impl Into<String>,
        app_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            token: token.into(),
            app_id: app_id.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `CUBIC_TOKEN`, `CUBIC_APP_ID`, `CUBIC_BASE_URL` and the optional
    /// `CUBIC_TIMEOUT_SECS`. `base_url` overrides the env var when given.
    pub fn from_env(base_url: Option<&str>) -> Result<Self> {
        let token = env::var(TOKEN_VAR)
            .with_context(|| format!("{TOKEN_VAR} environment variable not set"))?;
        let app_id = env::var(APP_ID_VAR)
            .with_context(|| format!("{APP_ID_VAR} environment variable not set"))?;
        let base_url = match base_url {
            Some(url) => url.to_string(),
            None => env::var(BASE_URL_VAR)
                .with_context(|| format!("{BASE_URL_VAR} environment variable not set"))?,
        };

        let mut config = Self::new(token, app_id, base_url);
        if let Ok(raw) = env::var(TIMEOUT_VAR) {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("{TIMEOUT_VAR} must be a whole number of seconds"))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.trace_loaded();
        Ok(config)
    }

    /// The check every client operation runs first.
    pub fn validate(&self) -> Result<(), CubicError> {
        validate::init(&self.token, &self.app_id)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.base_url,
            app_id = %self.app_id,
            token_set = !self.token.is_empty(),
            timeout_secs = self.timeout.as_secs(),
            "Loaded cubic client config"
        );
        debug!(config = ?self, "Client config (full debug)");
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("app_id", &self.app_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
