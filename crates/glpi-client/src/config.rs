//! Connection settings for the GLPI API.

use std::fmt;

use url::Url;

pub const GLPI_URL_ENV: &str = "GLPI_URL";
pub const GLPI_APP_TOKEN_ENV: &str = "GLPI_APP_TOKEN";
pub const GLPI_USER_TOKEN_ENV: &str = "GLPI_USER_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("invalid GLPI_URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Validated GLPI settings. Built once at startup and passed down; never
/// read from globals at request time.
#[derive(Clone, PartialEq, Eq)]
pub struct GlpiConfig {
    url: String,
    app_token: String,
    user_token: String,
}

impl GlpiConfig {
    pub fn new(
        url: impl Into<String>,
        app_token: impl Into<String>,
        user_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let url = non_empty(url.into(), GLPI_URL_ENV)?;
        let app_token = non_empty(app_token.into(), GLPI_APP_TOKEN_ENV)?;
        let user_token = non_empty(user_token.into(), GLPI_USER_TOKEN_ENV)?;

        let parsed = Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url,
                reason: "expected an http:// or https:// base URL".to_string(),
            });
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            app_token,
            user_token,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        Self::new(
            get(GLPI_URL_ENV)?,
            get(GLPI_APP_TOKEN_ENV)?,
            get(GLPI_USER_TOKEN_ENV)?,
        )
    }

    /// API base URL without a trailing slash, e.g. `http://glpi/apirest.php`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn app_token(&self) -> &str {
        &self.app_token
    }

    pub fn user_token(&self) -> &str {
        &self.user_token
    }
}

impl fmt::Debug for GlpiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlpiConfig")
            .field("url", &self.url)
            .field("app_token", &"<redacted>")
            .field("user_token", &"<redacted>")
            .finish()
    }
}

fn non_empty(value: String, name: &'static str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ConfigError::Missing(name))
    } else {
        Ok(trimmed.to_string())
    }
}
