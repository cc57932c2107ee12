//! HTTP API handlers and routes.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each resource
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//! - [`api::form`](crate::api::form) - Buffered multipart form parsing
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/auth`)
//! - `POST /api/auth/register` - Register the admin (first account only)
//! - `POST /api/auth/login` - Login and receive the `jwt` session cookie
//! - `GET|POST /api/auth/logout` - Clear the session cookie
//! - `GET /api/auth/me` - Current user
//!
//! ## Catalog
//! - `/api/article` (alias `/api/articles`) - Articles
//! - `/api/category` (alias `/api/categories`) - Categories, multipart writes
//! - `/api/product` (alias `/api/products`) - Products, multipart writes, paginated listing
//! - `/api/imageSlider` (alias `/api/image-slider`) - Slider images
//!
//! Reads are public. Writes require an admin session.
//!
//! # Errors
//!
//! Every failure is a JSON body `{message, stack}`. `stack` carries internal
//! detail only outside production.
//!
//! # OpenAPI Documentation
//!
//! The generated document is served at `/api/openapi.json`.

pub(crate) mod diagnostics;
/// OpenAPI document.
pub mod doc;
/// Multipart form buffering.
pub mod form;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
