use std::path::Path;

use tracing::debug;

use crate::disambiguate::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const ENDPOINT_VAR: &str = "OPENAI_ENDPOINT";
pub const DEFAULT_ENV_FILE: &str = "config/.env";

/// Process configuration for the disambiguation service.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Settings {
    /// Loads `env_file` (if present) into the environment without overriding
    /// variables already set, then reads the settings from the environment.
    pub fn load(env_file: &Path) -> Result<Self, ConfigError> {
        match dotenvy::from_path(env_file) {
            Ok(()) => debug!(path = %env_file.display(), "loaded env file"),
            Err(err) if err.not_found() => {
                debug!(path = %env_file.display(), "no env file, using process environment")
            }
            Err(err) => {
                return Err(ConfigError::Invalid {
                    key: "env file",
                    reason: err.to_string(),
                });
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let endpoint = lookup(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: ENDPOINT_VAR,
                reason: format!("{endpoint:?} is not an http(s) URL"),
            });
        }
        Ok(Self {
            api_key,
            model: lookup(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn missing_api_key_fails() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(API_KEY_VAR)));

        let err = Settings::from_lookup(lookup(&[(API_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn defaults_apply() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "sk-test")])).unwrap();
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = Settings::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (ENDPOINT_VAR, "ftp://example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENDPOINT_VAR, .. }));
    }

    #[test]
    fn debug_output_hides_key() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "sk-secret")])).unwrap();
        assert!(!format!("{settings:?}").contains("sk-secret"));
    }
}
