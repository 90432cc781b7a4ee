use std::env;
use std::time::Duration;

use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Session-level graph execution defaults with validation.
///
/// These seed the session's default graph options and timeout; per-profile
/// and per-statement options override them at request time.
#[derive(Clone, Debug, Validate)]
pub struct GraphClientConfig {
    /// Default timeout for graph queries, in milliseconds
    #[validate(range(
        min = 1,
        max = 3_600_000,
        message = "Graph timeout must be between 1ms and 1h"
    ))]
    pub graph_timeout_ms: u64,

    /// Default graph traversal source, configured on the server side
    #[validate(length(min = 1, message = "Graph source cannot be empty"))]
    pub graph_source: String,

    /// Default language for graph queries
    #[validate(length(min = 1, message = "Graph language cannot be empty"))]
    pub graph_language: String,
}

impl Default for GraphClientConfig {
    fn default() -> Self {
        Self {
            graph_timeout_ms: 32_000,
            graph_source: "default".to_string(),
            graph_language: "gremlin-groovy".to_string(),
        }
    }
}

impl GraphClientConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            graph_timeout_ms: parse_env_var("CASSGRAPH_GRAPH_TIMEOUT_MS", "32000")?,
            graph_source: env::var("CASSGRAPH_GRAPH_SOURCE").unwrap_or_else(|_| "default".to_string()),
            graph_language: env::var("CASSGRAPH_GRAPH_LANGUAGE")
                .unwrap_or_else(|_| "gremlin-groovy".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn graph_timeout(&self) -> Duration {
        Duration::from_millis(self.graph_timeout_ms)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
