use std::env;

/// Connection settings for the optional PostgreSQL store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// When unset the server runs on the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub statement_timeout_secs: u64,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub frontend_url: String,
    pub body_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connect_timeout_secs: 5,
                statement_timeout_secs: 45,
            },
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
                max_connections: parse_var(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
                connect_timeout_secs: parse_var(
                    "DATABASE_CONNECT_TIMEOUT_SECS",
                    defaults.database.connect_timeout_secs,
                ),
                statement_timeout_secs: parse_var(
                    "DATABASE_STATEMENT_TIMEOUT_SECS",
                    defaults.database.statement_timeout_secs,
                ),
            },
            host: env::var("BACKEND_HOST").unwrap_or(defaults.host),
            port: parse_var("BACKEND_PORT", defaults.port),
            environment: env::var("APP_ENV").unwrap_or(defaults.environment),
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            body_limit_bytes: parse_var("BODY_LIMIT_BYTES", defaults.body_limit_bytes),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

/// Read and parse a variable, keeping the default when it is missing or malformed.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.connect_timeout_secs, 5);
        assert_eq!(config.database.statement_timeout_secs, 45);
        assert!(config.database.url.is_none());
        assert!(config.is_development());
    }

    #[test]
    fn parse_var_falls_back_on_garbage() {
        env::set_var("TASKBOARD_TEST_PARSE_VAR", "not-a-number");
        assert_eq!(parse_var("TASKBOARD_TEST_PARSE_VAR", 7u32), 7);
        env::set_var("TASKBOARD_TEST_PARSE_VAR", " 42 ");
        assert_eq!(parse_var("TASKBOARD_TEST_PARSE_VAR", 7u32), 42);
        env::remove_var("TASKBOARD_TEST_PARSE_VAR");
    }

    #[test]
    fn production_is_not_development() {
        let config = AppConfig {
            environment: "production".to_string(),
            ..AppConfig::default()
        };
        assert!(!config.is_development());
    }
}
