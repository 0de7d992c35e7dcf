use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; only optional when running against the in-memory store.
    pub uri: Option<String>,
    pub name: String,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Profile defaults first, then specific env vars on top
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };
        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = env::var("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Ok(v) = env::var("SEED_SAMPLE_DATA") {
            self.server.seed_sample_data = parse_var("SEED_SAMPLE_DATA", &v)?;
        }

        if let Ok(v) = env::var("MONGODB_URI") {
            let v = v.trim();
            if !v.is_empty() {
                self.database.uri = Some(v.to_string());
            }
        }
        if let Ok(v) = env::var("MONGODB_DATABASE") {
            if !v.trim().is_empty() {
                self.database.name = v.trim().to_string();
            }
        }

        match env::var("JWT_SECRET") {
            Ok(v) if !v.is_empty() => self.security.jwt_secret = v,
            _ if self.environment != Environment::Development => {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            _ => tracing::warn!("JWT_SECRET not set, falling back to the development secret"),
        }
        if let Ok(v) = env::var("TOKEN_TTL_HOURS") {
            self.security.token_ttl_hours = parse_var("TOKEN_TTL_HOURS", &v)?;
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = parse_var("BCRYPT_COST", &v)?;
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self.ai.api_key = env::var("GEMINI_API_KEY")
            .map(|v| v.trim().to_string())
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        if let Ok(v) = env::var("GEMINI_MODEL") {
            if !v.trim().is_empty() {
                self.ai.model = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("GEMINI_BASE_URL") {
            if !v.trim().is_empty() {
                self.ai.base_url = parse_base_url("GEMINI_BASE_URL", v.trim())?;
            }
        }
        if let Ok(v) = env::var("AI_TIMEOUT_SECS") {
            self.ai.timeout_secs = parse_var("AI_TIMEOUT_SECS", &v)?;
        }

        Ok(self)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                seed_sample_data: true,
            },
            database: DatabaseConfig {
                uri: None,
                name: "LearnOnline".to_string(),
                connect_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                token_ttl_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: vec!["*".to_string()],
            },
            ai: AiConfig {
                api_key: String::new(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                timeout_secs: 30,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.server.seed_sample_data = false;
        config.security.jwt_secret = String::new();
        config
    }

    fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.database.connect_timeout_secs = 5;
        config
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

/// Absolute http(s) URL, returned without a trailing slash.
fn parse_base_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name,
        value: value.to_string(),
    };
    let url = url::Url::parse(value).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.seed_sample_data);
        assert_eq!(config.security.token_ttl_hours, 24);
        assert_eq!(config.security.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.ai.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.server.seed_sample_data);
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn parse_var_reports_name() {
        let err = parse_var::<u16>("PORT", "eighty").unwrap_err();
        assert_eq!(err.to_string(), "invalid value for PORT: eighty");
    }

    #[test]
    fn base_url_must_be_absolute_http() {
        assert_eq!(
            parse_base_url("GEMINI_BASE_URL", "http://localhost:9000/").unwrap(),
            "http://localhost:9000"
        );
        assert!(parse_base_url("GEMINI_BASE_URL", "localhost:9000").is_err());
        assert!(parse_base_url("GEMINI_BASE_URL", "ftp://example.org").is_err());
    }
}
