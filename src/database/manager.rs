use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection options from `DATABASE_URL` when set, otherwise from the `DB_*` fields.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, DatabaseError> {
    match &config.url {
        Some(url) => url
            .parse::<PgConnectOptions>()
            .map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string())),
        None => Ok(PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password)),
    }
}

/// Builds the pool without opening a connection; the first query connects.
pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let options = connect_options(config)?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect_lazy_with(options);

    info!(
        "Database pool configured (max_connections={}, timeout={}s)",
        config.max_connections, config.connection_timeout
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn database_config(pairs: &[(&str, &str)]) -> DatabaseConfig {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_source(|key| {
            pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .database
    }

    #[test]
    fn discrete_fields_build_options() {
        let config = database_config(&[("DB_HOST", "db"), ("DB_PORT", "6543"), ("DB_NAME", "registry")]);
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("registry"));
    }

    #[test]
    fn url_takes_precedence() {
        let config = database_config(&[
            ("DATABASE_URL", "postgres://app:pw@pg.internal:5433/hospital"),
            ("DB_HOST", "ignored"),
        ]);
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "pg.internal");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("hospital"));
    }

    #[test]
    fn rejects_bad_url() {
        let config = database_config(&[("DATABASE_URL", "not a url")]);
        assert!(matches!(
            connect_options(&config),
            Err(DatabaseError::InvalidDatabaseUrl(_))
        ));
    }
}
