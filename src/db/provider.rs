//! Database backend selection.
//!
//! ```rust,ignore
//! use storefront::db::DatabaseProvider;
//!
//! // In-memory database (tests)
//! let db = DatabaseProvider::Memory.create_client().await?;
//!
//! // Whatever DATABASE_URL points at
//! let db = DatabaseProvider::from_config(&config.database).create_client().await?;
//! ```

use super::turso::TursoClient;
use crate::types::Result;
use crate::utils::config::DatabaseConfig;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    Local {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote libsql/Turso database
    Remote {
        /// The database URL (e.g., `libsql://shop.turso.io`)
        url: String,
        /// Authentication token for the database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Picks the backend from `DATABASE_URL` and `DATABASE_AUTH_TOKEN`.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let url = config.url.trim();

        if url == ":memory:" {
            return DatabaseProvider::Memory;
        }

        let remote = ["libsql://", "https://", "http://", "wss://", "ws://"]
            .iter()
            .any(|scheme| url.starts_with(scheme));

        if remote {
            return DatabaseProvider::Remote {
                url: url.to_string(),
                auth_token: config.auth_token.clone().unwrap_or_default(),
            };
        }

        DatabaseProvider::Local {
            path: url.strip_prefix("file:").unwrap_or(url).to_string(),
        }
    }

    /// Opens the database and makes sure the schema exists.
    pub async fn create_client(&self) -> Result<TursoClient> {
        match self {
            DatabaseProvider::Memory => TursoClient::new_memory().await,
            DatabaseProvider::Local { path } => TursoClient::new_local(path).await,
            DatabaseProvider::Remote { url, auth_token } => {
                TursoClient::new_remote(url.clone(), auth_token.clone()).await
            }
        }
    }

    /// Backend label for startup logs; never includes credentials.
    pub fn describe(&self) -> String {
        match self {
            DatabaseProvider::Memory => "in-memory".to_string(),
            DatabaseProvider::Local { path } => format!("local file {}", path),
            DatabaseProvider::Remote { url, .. } => format!("remote {}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, token: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            auth_token: token.map(str::to_string),
        }
    }

    #[test]
    fn test_provider_from_url() {
        assert_eq!(
            DatabaseProvider::from_config(&config(":memory:", None)),
            DatabaseProvider::Memory
        );
        assert_eq!(
            DatabaseProvider::from_config(&config("./data/shop.db", None)),
            DatabaseProvider::Local {
                path: "./data/shop.db".to_string()
            }
        );
        assert_eq!(
            DatabaseProvider::from_config(&config("file:shop.db", None)),
            DatabaseProvider::Local {
                path: "shop.db".to_string()
            }
        );
        assert_eq!(
            DatabaseProvider::from_config(&config("libsql://shop.turso.io", Some("t"))),
            DatabaseProvider::Remote {
                url: "libsql://shop.turso.io".to_string(),
                auth_token: "t".to_string()
            }
        );
    }

    #[test]
    fn test_describe_hides_token() {
        let provider = DatabaseProvider::Remote {
            url: "libsql://shop.turso.io".to_string(),
            auth_token: "super-secret".to_string(),
        };

        assert!(!provider.describe().contains("super-secret"));
    }

    #[tokio::test]
    async fn test_memory_client_starts_empty() {
        let db = DatabaseProvider::Memory.create_client().await.unwrap();
        assert_eq!(db.user_count().await.unwrap(), 0);
    }
}
