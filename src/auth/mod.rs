//! Cookie-based JWT sessions and the access guard.
//!
//! # Module Structure
//!
//! - [`auth::jwt`](crate::auth::jwt) - token issuance/verification and password hashing
//! - [`auth::session`](crate::auth::session) - the `jwt` session cookie
//! - [`auth::guard`](crate::auth::guard) - authentication + authorization extractors
//!
//! # Flow
//!
//! Login and register call [`session::attach`], which issues a six-day HS256
//! token and sets it as an HTTP-only cookie. Protected handlers take an
//! extractor that runs the guard:
//!
//! ```ignore
//! use storefront::auth::guard::AdminOnly;
//!
//! async fn delete_product(AdminOnly(admin): AdminOnly, Path(id): Path<String>) -> Result<...> {
//!     // only reached for an authenticated admin
//! }
//! ```

/// Access guard and request extractors.
pub mod guard;
/// Token issuance, verification and password hashing.
pub mod jwt;
/// Session cookie helpers.
pub mod session;
