//! Client configuration: backend location, polling cadence and auth transport.
//!
//! # Design
//! - Defaults mirror the hosted dashboard (local backend on port 5000, 5 s poll).
//! - Environment overlays go through an injectable lookup so tests never touch
//!   process state.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
/// Link list refresh cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Per-request timeout for native transports.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Storage key (and file name) holding the credential.
pub const CREDENTIAL_KEY: &str = "authToken";

/// Environment variable names understood by [`ClientConfig::from_lookup`].
pub mod env {
    /// Backend base URL.
    pub const BACKEND_URL: &str = "PHISHWATCH_BACKEND_URL";
    /// Poll interval in whole seconds.
    pub const POLL_INTERVAL_SECS: &str = "PHISHWATCH_POLL_INTERVAL_SECS";
    /// HTTP timeout in whole seconds.
    pub const HTTP_TIMEOUT_SECS: &str = "PHISHWATCH_HTTP_TIMEOUT_SECS";
    /// `token-header` or `bearer`.
    pub const AUTH_SCHEME: &str = "PHISHWATCH_AUTH_SCHEME";
    /// Path of the credential file.
    pub const CREDENTIAL_PATH: &str = "PHISHWATCH_CREDENTIAL_PATH";
}

/// How the credential travels on authenticated requests.
///
/// Exactly one header is sent per request, whatever the endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// `authToken: <token>`.
    #[default]
    TokenHeader,
    /// `Authorization: Bearer <token>`.
    Bearer,
}

impl AuthScheme {
    /// Header name carrying the credential. Lowercase; header names are case-insensitive.
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::TokenHeader => "authtoken",
            Self::Bearer => "authorization",
        }
    }

    /// Header value for `token`.
    #[must_use]
    pub fn header_value(self, token: &str) -> String {
        match self {
            Self::TokenHeader => token.to_string(),
            Self::Bearer => format!("Bearer {token}"),
        }
    }

    /// Parse `token-header` / `bearer`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "token-header" | "token" | "authtoken" => Some(Self::TokenHeader),
            "bearer" => Some(Self::Bearer),
            _ => None,
        }
    }

    /// Stable name used in flags and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokenHeader => "token-header",
            Self::Bearer => "bearer",
        }
    }
}

/// Effective client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin; endpoint paths are joined onto it.
    pub base_url: Url,
    /// Delay between link refreshes.
    pub poll_interval: Duration,
    /// Per-request timeout (native transport only).
    pub request_timeout: Duration,
    /// Credential transport convention.
    pub auth_scheme: AuthScheme,
    /// Credential file override (native only).
    pub credential_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_scheme: AuthScheme::default(),
            credential_path: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value cannot be parsed or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = read(env::BACKEND_URL) {
            config.base_url = parse_base_url(env::BACKEND_URL, &value)?;
        }
        if let Some(value) = read(env::POLL_INTERVAL_SECS) {
            config.poll_interval = parse_secs(env::POLL_INTERVAL_SECS, &value)?;
        }
        if let Some(value) = read(env::HTTP_TIMEOUT_SECS) {
            config.request_timeout = parse_secs(env::HTTP_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = read(env::AUTH_SCHEME) {
            config.auth_scheme =
                AuthScheme::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                    name: env::AUTH_SCHEME,
                    value: value.clone(),
                    reason: "expected token-header or bearer",
                })?;
        }
        if let Some(value) = read(env::CREDENTIAL_PATH) {
            config.credential_path = Some(PathBuf::from(value.trim()));
        }
        Ok(config)
    }

    /// Credential file location: the override if set, else the platform default.
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use]
    pub fn credential_file(&self) -> Option<PathBuf> {
        self.credential_path
            .clone()
            .or_else(crate::credentials::default_credential_path)
    }
}

/// Parse and normalise a backend URL.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for unparsable or non-HTTP URLs.
pub fn parse_base_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: "not a valid URL",
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "scheme must be http or https",
        });
    }
    Ok(url)
}

/// Parse a positive number of seconds.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for non-numeric or zero values.
pub fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be greater than zero",
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected a whole number of seconds",
        }),
    }
}

fn default_base_url() -> Url {
    option_env!("PHISHWATCH_DEFAULT_BACKEND_URL")
        .and_then(|value| Url::parse(value).ok())
        .unwrap_or_else(|| {
            Url::parse(DEFAULT_BACKEND_URL).expect("default backend URL literal is valid")
        })
}
