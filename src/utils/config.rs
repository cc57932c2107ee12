//! Process configuration.
//!
//! Everything is read once at startup into [`Config`] and handed to the
//! router through `AppState`. Nothing reads the environment after that.

use serde::Deserialize;
use std::path::PathBuf;

/// Errors that can occur while building the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("Environment variable '{name}' has an invalid value: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Failed to load env file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cloudinary: CloudinaryConfig,
    pub environment: Environment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,
    /// Directory served for paths the API does not handle
    pub public_dir: PathBuf,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `:memory:`, a file path, or a `libsql://` URL
    pub url: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

const DEFAULT_DATABASE_URL: &str = "./data/storefront.db";
const DEFAULT_CLOUDINARY_BASE: &str = "https://api.cloudinary.com";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load a specific env file first, then read the process environment.
    pub fn from_env_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| get(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()));

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: "PORT".to_string(),
                    reason: e.to_string(),
                }
            })?,
            None => 3000,
        };

        let environment = match get("APP_ENV").as_deref().map(str::trim) {
            Some("production") => Environment::Production,
            Some("development") | None => Environment::Development,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "APP_ENV".to_string(),
                    reason: format!("expected 'production' or 'development', got '{other}'"),
                });
            }
        };

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "LOG_FORMAT".to_string(),
                    reason: format!("expected 'pretty' or 'json', got '{other}'"),
                });
            }
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let database_token = get("DATABASE_AUTH_TOKEN");
        if database_url.starts_with("libsql://") && database_token.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_AUTH_TOKEN".to_string()));
        }

        Ok(Config {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                cors_origins,
                public_dir: PathBuf::from(get("PUBLIC_DIR").unwrap_or_else(|| "public".to_string())),
                log_format,
            },
            database: DatabaseConfig {
                url: database_url,
                auth_token: database_token,
            },
            auth: AuthConfig {
                jwt_secret: require("JWT_SECRET")?,
            },
            cloudinary: CloudinaryConfig {
                cloud_name: require("CLOUDINARY_CLOUD_NAME")?,
                api_key: require("CLOUDINARY_API_KEY")?,
                api_secret: require("CLOUDINARY_API_SECRET")?,
                api_base: get("CLOUDINARY_API_BASE")
                    .unwrap_or_else(|| DEFAULT_CLOUDINARY_BASE.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("JWT_SECRET", "test-secret-at-least-32-characters-long"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).expect("config should load");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.database.url, "./data/storefront.db");
        assert_eq!(config.cloudinary.api_base, "https://api.cloudinary.com");
        assert_eq!(config.server.log_format, LogFormat::Pretty);
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_jwt_secret_fails_at_load() {
        let mut vars = base_vars();
        vars.remove("JWT_SECRET");

        match load(&vars) {
            Err(ConfigError::MissingEnvVar(name)) => assert_eq!(name, "JWT_SECRET"),
            other => panic!("expected missing JWT_SECRET, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_secret_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("JWT_SECRET", "   ");

        assert!(matches!(load(&vars), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_production_and_origins() {
        let mut vars = base_vars();
        vars.insert("APP_ENV", "production");
        vars.insert(
            "CORS_ORIGINS",
            "http://localhost:5173, https://shop.example.com/ ,",
        );
        vars.insert("PORT", "8080");

        let config = load(&vars).unwrap();
        assert!(config.is_production());
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://localhost:5173", "https://shop.example.com"]
        );
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = base_vars();
        vars.insert("PORT", "eighty");

        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "PORT"
        ));
    }

    #[test]
    fn test_remote_database_requires_token() {
        let mut vars = base_vars();
        vars.insert("DATABASE_URL", "libsql://shop.turso.io");

        assert!(matches!(
            load(&vars),
            Err(ConfigError::MissingEnvVar(ref name)) if name == "DATABASE_AUTH_TOKEN"
        ));

        vars.insert("DATABASE_AUTH_TOKEN", "token");
        assert!(load(&vars).is_ok());
    }
}
