//! Runtime settings
//!
//! Settings are read from the environment first, with explicit overrides
//! (CLI flags) applied on top. No config file is consulted.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default chat completions endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.moonshot.cn/v1";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "kimi-k2-turbo-preview";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "MOONSHOT_API_KEY";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "MOONSHOT_BASE_URL";

/// Environment variable overriding the model
pub const MODEL_ENV: &str = "MOONSHOT_MODEL";

/// Resolved runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Optional overrides layered on top of the environment
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl Settings {
    /// Load from the environment with overrides applied.
    ///
    /// Fails with [`Error::Config`] when no API key is available from either
    /// source.
    pub fn load(overrides: SettingsOverrides) -> Result<Self> {
        let api_key = overrides
            .api_key
            .or_else(|| non_empty_env(API_KEY_ENV))
            .ok_or_else(|| {
                Error::Config(format!("{} is not set and no --api-key was given", API_KEY_ENV))
            })?;

        let base_url = overrides
            .base_url
            .or_else(|| non_empty_env(BASE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = overrides
            .model
            .or_else(|| non_empty_env(MODEL_ENV))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_defaults() {
        let settings = Settings::load(SettingsOverrides {
            api_key: Some("sk-test".into()),
            base_url: Some("http://localhost:9999/v1".into()),
            model: Some("kimi-k2-turbo-preview".into()),
        })
        .unwrap();

        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        // Only meaningful when the variable is absent from the test
        // environment; skip otherwise rather than mutate process env.
        if std::env::var(API_KEY_ENV).is_ok() {
            return;
        }
        let err = Settings::load(SettingsOverrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
