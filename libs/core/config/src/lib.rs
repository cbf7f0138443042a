pub mod tracing;

use std::env;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' must be specified")]
    MissingEnvVar(String),
}

impl ConfigError {
    /// Name of the offending environment variable.
    pub fn key(&self) -> &str {
        match self {
            ConfigError::MissingEnvVar(key) => key,
        }
    }
}

/// Application environment, selects the log format
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development, // Local runs: pretty logs
    Production,  // Cluster deployments: JSON logs
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read a variable that must be set to a non-empty value.
///
/// An empty string is treated the same as an unset variable.
pub fn env_non_empty(key: &str) -> Result<String, ConfigError> {
    env_optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read an optional variable; unset and empty both yield `None`
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        for value in ["production", "PRODUCTION", "Production"] {
            temp_env::with_var("APP_ENV", Some(value), || {
                assert_eq!(Environment::from_env(), Environment::Production);
            });
        }
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_non_empty_rejects_empty_and_unset() {
        temp_env::with_var("CFG_NON_EMPTY", Some(""), || {
            let err = env_non_empty("CFG_NON_EMPTY").unwrap_err();
            assert_eq!(err.key(), "CFG_NON_EMPTY");
            assert!(err.to_string().contains("must be specified"));
        });
        temp_env::with_var_unset("CFG_NON_EMPTY", || {
            assert!(matches!(
                env_non_empty("CFG_NON_EMPTY"),
                Err(ConfigError::MissingEnvVar(_))
            ));
        });
        temp_env::with_var("CFG_NON_EMPTY", Some("value"), || {
            assert_eq!(env_non_empty("CFG_NON_EMPTY").unwrap(), "value");
        });
    }

    #[test]
    fn test_env_optional() {
        temp_env::with_var("CFG_OPTIONAL", Some(""), || {
            assert_eq!(env_optional("CFG_OPTIONAL"), None);
        });
        temp_env::with_var("CFG_OPTIONAL", Some("nats://broker:4222"), || {
            assert_eq!(
                env_optional("CFG_OPTIONAL").as_deref(),
                Some("nats://broker:4222")
            );
        });
    }
}
