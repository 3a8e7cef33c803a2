use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret-change-this-in-production";

/// Upper bound for `JWT_EXPIRATION`: one year.
pub const MAX_JWT_EXPIRATION_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in {0:?} environment")]
    MissingSecret(Environment),

    #[error("JWT_SECRET must not be empty")]
    EmptySecret,

    #[error("JWT_EXPIRATION must be between 1 and 31536000 seconds (one year)")]
    InvalidExpiration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub pagination: PaginationConfig,
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
    /// Prefix stripped by the router, e.g. `/api`.
    pub base_path: String,
    /// Adds internal error details to 500 responses.
    pub debug: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_secret_from_env: bool,
    pub jwt_expiration_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Resolves the configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("APP_DEBUG") {
            self.server.debug = v.parse().unwrap_or(self.server.debug);
        }
        if let Some(v) = lookup("API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("API_BASE_PATH") {
            self.server.base_path = v;
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|url| !url.is_empty());
        }
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASS") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
            self.security.jwt_secret_from_env = true;
        }
        if let Some(v) = lookup("JWT_EXPIRATION") {
            self.security.jwt_expiration_secs = v.parse().unwrap_or(self.security.jwt_expiration_secs);
        }

        // Pagination overrides
        if let Some(v) = lookup("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = v.parse().unwrap_or(self.pagination.default_limit);
        }
        if let Some(v) = lookup("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = v.parse().unwrap_or(self.pagination.max_limit);
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.environment == Environment::Production && !self.security.jwt_secret_from_env {
            return Err(ConfigError::MissingSecret(self.environment));
        }
        if !(1..=MAX_JWT_EXPIRATION_SECS).contains(&self.security.jwt_expiration_secs) {
            return Err(ConfigError::InvalidExpiration);
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                base_path: String::new(),
                debug: true,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            database: DatabaseConfig::defaults(10, 30),
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_secret_from_env: false,
                jwt_expiration_secs: 3600,
            },
            pagination: PaginationConfig {
                default_limit: 10,
                max_limit: 100,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                base_path: String::new(),
                debug: false,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            database: DatabaseConfig::defaults(20, 10),
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_secret_from_env: false,
                jwt_expiration_secs: 3600,
            },
            pagination: PaginationConfig {
                default_limit: 10,
                max_limit: 100,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                base_path: String::new(),
                debug: false,
                max_request_size_bytes: 512 * 1024, // 512KB
            },
            database: DatabaseConfig::defaults(50, 5),
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_secret_from_env: false,
                jwt_expiration_secs: 3600,
            },
            pagination: PaginationConfig {
                default_limit: 10,
                max_limit: 50,
            },
        }
    }
}

impl DatabaseConfig {
    fn defaults(max_connections: u32, connection_timeout: u64) -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: "hospital_db".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_connections,
            connection_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.server.debug);
        assert_eq!(config.security.jwt_expiration_secs, 3600);
        assert_eq!(config.pagination.default_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.server.debug);
        assert_eq!(config.validate(), Err(ConfigError::EmptySecret));
    }

    #[test]
    fn production_requires_explicit_secret() {
        let config = from_pairs(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.validate().is_ok());

        let config = from_pairs(&[("APP_ENV", "prod"), ("JWT_SECRET", "")]);
        assert_eq!(config.validate(), Err(ConfigError::EmptySecret));
    }

    #[test]
    fn overrides_apply_over_preset() {
        let config = from_pairs(&[
            ("DB_HOST", "db.internal"),
            ("DB_NAME", "registry"),
            ("DB_USER", "app"),
            ("DB_PASS", "pw"),
            ("JWT_EXPIRATION", "900"),
            ("API_BASE_PATH", "/api"),
            ("PORT", "8181"),
            ("APP_DEBUG", "false"),
            ("PAGINATION_MAX_LIMIT", "25"),
        ]);

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.name, "registry");
        assert_eq!(config.database.user, "app");
        assert_eq!(config.database.password, "pw");
        assert_eq!(config.security.jwt_expiration_secs, 900);
        assert_eq!(config.server.base_path, "/api");
        assert_eq!(config.server.port, 8181);
        assert!(!config.server.debug);
        assert_eq!(config.pagination.max_limit, 25);
    }

    #[test]
    fn expiration_must_be_within_bounds() {
        let config = from_pairs(&[("JWT_EXPIRATION", "9223372036854775807")]);
        assert_eq!(config.security.jwt_expiration_secs, i64::MAX);
        assert_eq!(config.validate(), Err(ConfigError::InvalidExpiration));

        let config = from_pairs(&[("JWT_EXPIRATION", "0")]);
        assert_eq!(config.validate(), Err(ConfigError::InvalidExpiration));

        let config = from_pairs(&[("JWT_EXPIRATION", "31536000")]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let config = from_pairs(&[("JWT_EXPIRATION", "soon"), ("DB_PORT", "x")]);
        assert_eq!(config.security.jwt_expiration_secs, 3600);
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn serialized_config_omits_secrets() {
        let config = from_pairs(&[("JWT_SECRET", "top-secret"), ("DB_PASS", "hunter2")]);
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("top-secret"));
        assert!(!rendered.contains("hunter2"));
    }
}
