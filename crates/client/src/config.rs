use std::time::Duration;

/// A client configuration variable could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got `{value}`")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Where the API lives and how long a request may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin without the `/api/v1` prefix.
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load from the environment.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `TASKHUB_API_URL`              | `http://localhost:3000` |
    /// | `TASKHUB_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = match lookup("TASKHUB_API_URL") {
            Some(raw) => {
                let url = raw.trim().trim_end_matches('/').to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError {
                        var: "TASKHUB_API_URL",
                        expected: "an http(s) URL",
                        value: raw,
                    });
                }
                url
            }
            None => defaults.api_url,
        };

        let request_timeout = match lookup("TASKHUB_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError {
                    var: "TASKHUB_REQUEST_TIMEOUT_SECS",
                    expected: "a whole number of seconds",
                    value: raw,
                })?,
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_url,
            request_timeout,
        })
    }
}
