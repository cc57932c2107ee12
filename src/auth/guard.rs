//! Access guard: authentication followed by authorization.
//!
//! Both stages run through [`require_role`], which returns a tagged
//! [`Access`] outcome. Authorization can never be evaluated without a
//! resolved user, and a token whose subject no longer exists is treated as
//! an authentication failure.

use crate::{
    auth::session,
    types::{AppError, User},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

/// Privilege level a route demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Any authenticated user
    Member,
    /// Users with `is_admin`
    Admin,
}

impl Role {
    fn admits(self, user: &User) -> bool {
        match self {
            Role::Member => true,
            Role::Admin => user.is_admin,
        }
    }
}

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No session cookie
    NoToken,
    /// Bad signature, malformed, or expired token
    TokenFailed,
    /// Valid token for a user that no longer exists
    UnknownUser,
}

impl AuthFailure {
    /// Body message of the 401 response.
    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::NoToken => "Not authorized, no token",
            AuthFailure::TokenFailed => "Not authorized, token failed",
            AuthFailure::UnknownUser => "Not authorized, user not found",
        }
    }
}

/// Outcome of guarding one request.
#[derive(Debug, Clone)]
pub enum Access {
    /// Authenticated and holding the required role
    Granted(User),
    /// No usable session
    Unauthenticated(AuthFailure),
    /// Authenticated, but lacking the role
    Forbidden(User),
}

impl Access {
    /// The granted user, or the error to respond with.
    pub fn into_result(self) -> Result<User, AppError> {
        match self {
            Access::Granted(user) => Ok(user),
            Access::Unauthenticated(reason) => Err(AppError::Auth(reason.message().to_string())),
            Access::Forbidden(_) => Err(AppError::Forbidden("Not authorized as admin".to_string())),
        }
    }
}

/// Resolves the session cookie to a user and checks it against `role`.
///
/// Database failures during the lookup are real errors and propagate.
pub async fn require_role(
    state: &AppState,
    jar: &CookieJar,
    role: Role,
) -> Result<Access, AppError> {
    let Some(token) = session::token_from(jar) else {
        return Ok(Access::Unauthenticated(AuthFailure::NoToken));
    };

    let claims = match state.auth_service.verify_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "session token rejected");
            return Ok(Access::Unauthenticated(AuthFailure::TokenFailed));
        }
    };

    let Some(user) = state.db.get_user_by_id(&claims.id).await? else {
        return Ok(Access::Unauthenticated(AuthFailure::UnknownUser));
    };

    if role.admits(&user) {
        Ok(Access::Granted(user))
    } else {
        Ok(Access::Forbidden(user))
    }
}

async fn guard(parts: &Parts, state: &AppState, role: Role) -> Result<User, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let access = require_role(state, &jar, role).await?;

    if !matches!(access, Access::Granted(_)) {
        tracing::warn!(
            method = %parts.method,
            path = %parts.uri.path(),
            ?role,
            outcome = ?access_label(&access),
            "access denied"
        );
    }

    access.into_result()
}

fn access_label(access: &Access) -> &'static str {
    match access {
        Access::Granted(_) => "granted",
        Access::Unauthenticated(reason) => reason.message(),
        Access::Forbidden(_) => "forbidden",
    }
}

/// Extractor for routes that need any signed-in user.
pub struct Authenticated(pub User);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guard(parts, state, Role::Member).await.map(Authenticated)
    }
}

/// Extractor for admin-only routes.
///
/// Place it before any body extractor so uploads are never read for
/// callers that would be rejected.
pub struct AdminOnly(pub User);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guard(parts, state, Role::Admin).await.map(AdminOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> User {
        User {
            id: "u1".into(),
            name: "A".into(),
            email: "a@x.com".into(),
            phone: "1".into(),
            password_hash: String::new(),
            is_admin,
        }
    }

    #[test]
    fn test_role_admission() {
        assert!(Role::Member.admits(&user(false)));
        assert!(Role::Admin.admits(&user(true)));
        assert!(!Role::Admin.admits(&user(false)));
    }

    #[test]
    fn test_outcome_messages() {
        let err = Access::Unauthenticated(AuthFailure::NoToken)
            .into_result()
            .unwrap_err();
        assert_eq!(err.public_message(), "Not authorized, no token");

        let err = Access::Unauthenticated(AuthFailure::TokenFailed)
            .into_result()
            .unwrap_err();
        assert_eq!(err.public_message(), "Not authorized, token failed");

        let err = Access::Forbidden(user(false)).into_result().unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(err.public_message(), "Not authorized as admin");
    }

    #[test]
    fn test_granted_yields_user() {
        let granted = Access::Granted(user(true)).into_result().unwrap();
        assert!(granted.is_admin);
    }
}
