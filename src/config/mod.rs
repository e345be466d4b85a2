//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU64, path::Path, str::FromStr, time::Duration};

use clap::{Args, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "postwire";
const ENV_PREFIX: &str = "POSTWIRE";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MEDIA_PATH: &str = "media/";

/// Overrides accepted on the command line; each one beats file and environment.
#[derive(Debug, Args, Default, Clone)]
pub struct ClientOverrides {
    /// Override the API base URL, e.g. <https://blog.example.com>.
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Override the media base URL used to resolve image paths.
    #[arg(long = "media-url", value_name = "URL")]
    pub media_url: Option<String>,

    /// CSRF token attached to mutating requests. Hidden from help; prefer
    /// `POSTWIRE_CSRF_TOKEN` to keep it out of shell history.
    #[arg(long = "csrf-token", env = "POSTWIRE_CSRF_TOKEN", hide = true, hide_env_values = true)]
    pub csrf_token: Option<String>,

    /// Override the per-request timeout budget.
    #[arg(long = "timeout-ms", value_name = "MILLIS")]
    pub timeout_ms: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Abort superseded post revalidations when navigating to another post.
    #[arg(
        long = "cancel-on-navigate",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cancel_on_navigate: Option<bool>,
}

/// Fully-resolved client settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub navigation: NavigationSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Always ends with `/` so endpoint paths join beneath it.
    pub base_url: Url,
    /// Always ends with `/`.
    pub media_url: Url,
    pub timeout: Duration,
    pub csrf_token: Option<String>,
    pub user_agent: String,
}

impl ApiSettings {
    /// Settings for `base_url` with every other field at its default.
    pub fn new(base_url: Url) -> Result<Self, LoadError> {
        let base_url = with_trailing_slash(base_url);
        let media_url = base_url
            .join(DEFAULT_MEDIA_PATH)
            .map_err(|err| LoadError::invalid("api.media_url", err.to_string()))?;
        Ok(Self {
            base_url,
            media_url,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            csrf_token: None,
            user_agent: default_user_agent().to_string(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationSettings {
    pub cancel_on_navigate: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn default_user_agent() -> &'static str {
    concat!("postwire/", env!("CARGO_PKG_VERSION"))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(config_file: Option<&Path>, overrides: &ClientOverrides) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(overrides);
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    logging: RawLoggingSettings,
    navigation: RawNavigationSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &ClientOverrides) {
        if let Some(url) = overrides.api_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(url) = overrides.media_url.as_ref() {
            self.api.media_url = Some(url.clone());
        }
        if let Some(token) = overrides.csrf_token.as_ref() {
            self.api.csrf_token = Some(token.clone());
        }
        if let Some(timeout) = overrides.timeout_ms {
            self.api.timeout_ms = Some(timeout);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(cancel) = overrides.cancel_on_navigate {
            self.navigation.cancel_on_navigate = Some(cancel);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            logging,
            navigation,
        } = raw;

        let api = build_api_settings(api)?;
        let logging = build_logging_settings(logging)?;
        let navigation = NavigationSettings {
            cancel_on_navigate: navigation.cancel_on_navigate.unwrap_or(false),
        };

        Ok(Self {
            api,
            logging,
            navigation,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let base_value = api
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            LoadError::invalid(
                "api.base_url",
                "an API base URL is required (use --api-url or POSTWIRE_API__BASE_URL)",
            )
        })?;
    let base_url = parse_absolute_url(&base_value, "api.base_url")?;

    let mut settings = ApiSettings::new(base_url)?;

    if let Some(media) = api.media_url {
        let media = media.trim();
        if !media.is_empty() {
            settings.media_url = with_trailing_slash(parse_absolute_url(media, "api.media_url")?);
        }
    }

    let timeout_ms = api.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    let timeout_ms = NonZeroU64::new(timeout_ms)
        .ok_or_else(|| LoadError::invalid("api.timeout_ms", "must be greater than zero"))?;
    settings.timeout = Duration::from_millis(timeout_ms.get());

    settings.csrf_token = api.csrf_token.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    if let Some(agent) = api.user_agent {
        if agent.trim().is_empty() {
            return Err(LoadError::invalid(
                "api.user_agent",
                "must not be empty when set",
            ));
        }
        settings.user_agent = agent;
    }

    Ok(settings)
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    media_url: Option<String>,
    timeout_ms: Option<u64>,
    csrf_token: Option<String>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNavigationSettings {
    cancel_on_navigate: Option<bool>,
}

fn parse_absolute_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value).map_err(|err| LoadError::invalid(key, err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(LoadError::invalid(key, "URL cannot be used as a base"));
    }
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests;
