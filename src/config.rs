//! Client configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults.
//! 2. An optional file named by `PAWZZLE_CONFIG_FILE` (YAML, TOML or JSON).
//! 3. `PAWZZLE_` prefixed environment variables with `__` as the section
//!    separator, e.g. `PAWZZLE_API__TIMEOUT_SECS=10`.
//! 4. The flat base URL variables `PAWZZLE_API_BASE_URL`, then
//!    `PAWZZLE_API_URL`.

use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::chat::ThreadKeyPolicy;
use crate::i18n::Locale;

/// Where the app is running; selects the default backend host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    #[default]
    Web,
    IosSimulator,
    AndroidEmulator,
    /// A physical phone on the developer LAN.
    Device,
}

const LOCAL_URL: &str = "http://localhost:8080";
const ANDROID_EMULATOR_URL: &str = "http://10.0.2.2:8080";
const LAN_URL: &str = "http://172.25.155.42:8080";

impl Platform {
    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Web | Self::IosSimulator => LOCAL_URL,
            Self::AndroidEmulator => ANDROID_EMULATOR_URL,
            Self::Device => LAN_URL,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Explicit backend URL. Wins over the platform default.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    pub timeout_secs: u64,
    /// Upper bound for a whole assistant reply stream.
    pub stream_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChatConfig {
    #[serde(default)]
    pub thread_key_policy: ThreadKeyPolicy,
}

impl ApiConfig {
    /// The base URL to use, without a trailing slash.
    #[must_use]
    pub fn resolved_base_url(&self) -> String {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.platform.default_base_url());
        raw.strip_suffix('/').unwrap_or(raw).to_string()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }
}

impl ClientConfig {
    /// Load `.env` (if present) and then every configured source.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Load from defaults, the optional file and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.timeout_secs", 30)?
            .set_default("api.stream_timeout_secs", 120)?
            .set_default("api.platform", "web")?
            .set_default("locale", "zh-CN")?
            .set_default("chat.thread_key_policy", "per-counterpart")?;

        if let Some(path) = non_empty_var("PAWZZLE_CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&path));
        }

        builder = builder.add_source(
            Environment::with_prefix("PAWZZLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) =
            non_empty_var("PAWZZLE_API_BASE_URL").or_else(|| non_empty_var("PAWZZLE_API_URL"))
        {
            builder = builder.set_override("api.base_url", url)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults pointing at an explicit backend; handy for tests and tools.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: Some(base_url.into()),
                platform: Platform::default(),
                timeout_secs: 30,
                stream_timeout_secs: 120,
            },
            locale: Locale::default(),
            chat: ChatConfig::default(),
        }
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.resolved_base_url();
        Url::parse(&base_url)
            .map_err(|e| ConfigError::Message(format!("invalid api base url {base_url:?}: {e}")))?;
        if self.api.timeout_secs == 0 || self.api.stream_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "api timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
