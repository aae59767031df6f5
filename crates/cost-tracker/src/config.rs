//! Startup configuration.
//!
//! Everything is read once, validated, and handed to the clients. A missing
//! table name or credential fails here with a [`ConfigError`] naming the
//! variable, instead of surfacing later as a failed AWS call.

use thiserror::Error;
use url::Url;

/// Environment variable naming the DynamoDB table.
pub const ENV_TABLE: &str = "DYNAMODB_TABLE";
/// Primary region variable (set by the Lambda platform).
pub const ENV_REGION: &str = "AWS_REGION";
/// Fallback region variable used by the AWS CLI.
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
/// Optional Cost Explorer endpoint override.
pub const ENV_COST_EXPLORER_ENDPOINT: &str = "COST_EXPLORER_ENDPOINT";
/// Optional DynamoDB endpoint override (e.g. DynamoDB Local).
pub const ENV_DYNAMODB_ENDPOINT: &str = "DYNAMODB_ENDPOINT";
/// Log output format, `json` or `pretty`.
pub const ENV_LOG_FORMAT: &str = "COST_TRACKER_LOG_FORMAT";

/// Region used when neither region variable is set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but its value is unusable.
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Static AWS credentials.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl AwsCredentials {
    /// Create credentials without a session token.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token (temporary credentials).
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line, for CloudWatch.
    #[default]
    Json,
    /// Human-readable output for local runs.
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("expected `json` or `pretty`, got `{other}`")),
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB table holding cost records.
    pub table_name: String,
    /// Region for the DynamoDB endpoint.
    pub region: String,
    pub credentials: AwsCredentials,
    pub cost_explorer_endpoint: Option<Url>,
    pub dynamodb_endpoint: Option<Url>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty and whitespace-only values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let table_name = require(ENV_TABLE)?;
        let region = get(ENV_REGION)
            .or_else(|| get(ENV_DEFAULT_REGION))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut credentials =
            AwsCredentials::new(require(ENV_ACCESS_KEY_ID)?, require(ENV_SECRET_ACCESS_KEY)?);
        if let Some(token) = get(ENV_SESSION_TOKEN) {
            credentials = credentials.with_session_token(token);
        }

        let cost_explorer_endpoint = get(ENV_COST_EXPLORER_ENDPOINT)
            .map(|raw| parse_endpoint(ENV_COST_EXPLORER_ENDPOINT, &raw))
            .transpose()?;
        let dynamodb_endpoint = get(ENV_DYNAMODB_ENDPOINT)
            .map(|raw| parse_endpoint(ENV_DYNAMODB_ENDPOINT, &raw))
            .transpose()?;

        let log_format = match get(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: ENV_LOG_FORMAT,
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            table_name,
            region,
            credentials,
            cost_explorer_endpoint,
            dynamodb_endpoint,
            log_format,
        })
    }
}

fn parse_endpoint(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("`{raw}` is not an http(s) URL"),
        });
    }
    Ok(url)
}
