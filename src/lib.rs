//! # Storefront
//!
//! Admin catalog API for a small shop: articles, categories, products and a
//! home page image slider, with cookie-based JWT sessions and images hosted
//! on Cloudinary.
//!
//! ## Overview
//!
//! Storefront can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `storefront-server` binary
//! 2. **As a library** - Build the router yourself, for example with a
//!    different [`media::ImageHost`]
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use storefront::{api::routes::create_router, AppState, Config, DatabaseProvider};
//! use std::sync::Arc;
//!
//! let config = Config::from_env()?;
//! let db = DatabaseProvider::from_config(&config.database).create_client().await?;
//! let images = Arc::new(storefront::media::CloudinaryClient::new(&config.cloudinary)?);
//!
//! let state = AppState::new(config, db, images)?;
//! let app = create_router(state);
//! ```
//!
//! ## Access model
//!
//! The first account registered becomes the admin and registration closes.
//! Reads are public; every write requires the admin's session cookie.
//!
//! ## Modules
//!
//! - [`api`] - REST handlers and routes
//! - [`auth`] - Tokens, session cookies and the access guard
//! - [`db`] - libsql persistence
//! - [`media`] - Image validation and hosting
//! - [`types`] - Domain types and error handling
//! - [`utils`] - Configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// JWT sessions and the access guard.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Database client (libsql: local file, in-memory or remote Turso).
pub mod db;
/// Image upload validation and the image host client.
#[allow(missing_docs)]
pub mod media;
/// Core types (entities, requests, responses, errors).
#[allow(missing_docs)]
pub mod types;
/// Configuration utilities.
#[allow(missing_docs)]
pub mod utils;

use std::sync::Arc;

pub use auth::jwt::AuthService;
pub use db::{DatabaseProvider, TursoClient};
pub use media::ImageHost;
pub use types::{AppError, Result};
pub use utils::config::Config;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Process configuration, read once at startup
    pub config: Arc<Config>,
    /// Database client
    pub db: Arc<TursoClient>,
    /// Token signing and password hashing
    pub auth_service: Arc<AuthService>,
    /// Remote image storage
    pub images: Arc<dyn ImageHost>,
}

impl AppState {
    /// Builds the state; fails if the signing secret is unusable.
    pub fn new(config: Config, db: TursoClient, images: Arc<dyn ImageHost>) -> Result<Self> {
        let auth_service = AuthService::new(&config.auth.jwt_secret)?;

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            auth_service: Arc::new(auth_service),
            images,
        })
    }
}
