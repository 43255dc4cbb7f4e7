//! Configuration types and environment loading.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use crate::error::ConfigError;

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum model/tool round trips per question.
    pub max_rounds: usize,
    /// Sampling temperature for SQL generation.
    pub temperature: f32,
    /// Maximum rows fetched per query.
    pub max_rows: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            temperature: 0.0,
            max_rows: 100,
        }
    }
}

/// Runtime settings loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// OpenAI API key.
    pub openai_api_key: SecretString,
    /// Chat model to drive the agent with.
    pub model: String,
    /// Override for the OpenAI-compatible endpoint.
    pub openai_base_url: Option<String>,
    /// Resolved path to the BigQuery service-account key file.
    pub credentials_path: PathBuf,
    /// Port for the web chat server.
    pub http_port: u16,
    /// Agent behavior knobs.
    pub agent: AgentConfig,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// `OPENAI_API_KEY` and `GOOGLE_APPLICATION_CREDENTIALS` are required;
    /// everything else falls back to defaults. A relative credentials path is
    /// resolved against the current working directory, matching how the key
    /// file is usually referenced from a project checkout.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = SecretString::from(require_env("OPENAI_API_KEY")?);
        let credentials_path =
            resolve_credentials_path(&require_env("GOOGLE_APPLICATION_CREDENTIALS")?);

        let model = std::env::var("CITIBIKE_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let openai_base_url = std::env::var("CITIBIKE_OPENAI_BASE_URL").ok();
        let http_port = parse_env("CITIBIKE_HTTP_PORT", 8080u16)?;

        let agent = AgentConfig {
            max_rounds: parse_env("CITIBIKE_MAX_ROUNDS", AgentConfig::default().max_rounds)?,
            temperature: parse_env("CITIBIKE_TEMPERATURE", AgentConfig::default().temperature)?,
            max_rows: parse_env("CITIBIKE_MAX_ROWS", AgentConfig::default().max_rows)?,
        };
        if agent.max_rounds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CITIBIKE_MAX_ROUNDS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            openai_api_key,
            model,
            openai_base_url,
            credentials_path,
            http_port,
            agent,
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Resolve a credentials path: absolute paths pass through, relative ones are
/// anchored at the current working directory.
fn resolve_credentials_path(raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_config_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_rounds, 8);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_rows, 100);
    }

    #[test]
    fn missing_required_var_names_the_variable() {
        let err = require_env("CITIBIKE_TEST_UNSET_VAR").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: CITIBIKE_TEST_UNSET_VAR"
        );
    }

    #[test]
    fn relative_credentials_path_is_anchored_at_cwd() {
        let resolved = resolve_credentials_path("keys/service-account.json");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("keys/service-account.json"));
    }

    #[test]
    fn absolute_credentials_path_passes_through() {
        let resolved = resolve_credentials_path("/etc/keys/sa.json");
        assert_eq!(resolved, PathBuf::from("/etc/keys/sa.json"));
    }
}
