//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `ARGVIEWER` prefix and
//! `__` between nesting levels.
//!
//! # Example
//!
//! ```no_run
//! use argviewer::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod proposals;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use proposals::ProposalsConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server and logging configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Proposal service tunables
    #[serde(default)]
    pub proposals: ProposalsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `ARGVIEWER__*` variables.
    ///
    /// - `ARGVIEWER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ARGVIEWER__DATABASE__URL=...` -> `database.url = ...`
    /// - `ARGVIEWER__PROPOSALS__ROOT_FILTER=whenever_filtered`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ARGVIEWER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        Ok(())
    }

    /// JSON log output, forced on in production.
    pub fn use_json_logs(&self) -> bool {
        self.server.json_logs || self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::proposal::RootFilterPolicy;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("ARGVIEWER__DATABASE__URL", "postgresql://test@localhost/test");
    }

    fn clear_env() {
        env::remove_var("ARGVIEWER__DATABASE__URL");
        env::remove_var("ARGVIEWER__SERVER__PORT");
        env::remove_var("ARGVIEWER__SERVER__ENVIRONMENT");
        env::remove_var("ARGVIEWER__SERVER__JSON_LOGS");
        env::remove_var("ARGVIEWER__PROPOSALS__ROOT_FILTER");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.proposals.root_filter, RootFilterPolicy::AuthorScoped);
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("ARGVIEWER__SERVER__PORT", "3000");
        env::set_var("ARGVIEWER__SERVER__ENVIRONMENT", "production");
        env::set_var("ARGVIEWER__SERVER__JSON_LOGS", "true");
        env::set_var("ARGVIEWER__PROPOSALS__ROOT_FILTER", "whenever_filtered");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.server.is_production());
        assert!(config.server.json_logs);
        assert_eq!(
            config.proposals.root_filter,
            RootFilterPolicy::WheneverFiltered
        );
    }

    #[test]
    fn test_production_defaults_to_json_logs() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let development = AppConfig::load();
        env::set_var("ARGVIEWER__SERVER__ENVIRONMENT", "production");
        let production = AppConfig::load();
        clear_env();

        let development = development.unwrap();
        assert!(!development.server.json_logs);
        assert!(!development.use_json_logs());

        let production = production.unwrap();
        assert!(!production.server.json_logs);
        assert!(production.use_json_logs());
    }

    #[test]
    fn test_missing_database_url_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
