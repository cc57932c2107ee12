//! Session cookie transport.
//!
//! The token travels in an HTTP-only cookie named `jwt`. Issuing a session sets
//! it; logging out overwrites it with an empty, already-expired value.

use crate::auth::jwt::{AuthService, SESSION_TTL_DAYS};
use crate::types::{Result, SessionResponse, User};
use axum::{http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// Builds the session cookie carrying `token`.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(SESSION_TTL_DAYS))
        .expires(OffsetDateTime::now_utc() + Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Builds the cookie that replaces a session with nothing.
pub fn expired_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Reads the raw session token, if the request carries a non-empty one.
pub fn token_from(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}

/// Issues a token for `user`, sets it as the session cookie and writes
/// `{status: "success", data: user}` with `status`.
///
/// The user's password hash is never serialized.
pub fn attach(
    auth: &AuthService,
    secure: bool,
    jar: CookieJar,
    user: User,
    status: StatusCode,
) -> Result<impl IntoResponse> {
    let token = auth.issue_token(&user.id)?;
    let jar = jar.add(session_cookie(token, secure));

    tracing::info!(user_id = %user.id, "session issued");

    Ok((
        status,
        jar,
        Json(SessionResponse::success(user)),
    ))
}

/// Clears the session cookie. Needs no prior session.
pub fn clear(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(expired_cookie(secure))
}
