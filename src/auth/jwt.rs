use crate::types::{AppError, Claims, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Session lifetime, shared by the token `exp` claim and the cookie expiry.
pub const SESSION_TTL_DAYS: i64 = 6;

/// [`SESSION_TTL_DAYS`] as a duration.
pub fn session_ttl() -> Duration {
    Duration::days(SESSION_TTL_DAYS)
}

/// Authentication service for session tokens and password hashing.
///
/// Passwords are hashed with Argon2id. Tokens are HS256 JWTs whose payload
/// carries only the user id; the server keeps no session table.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    /// Creates a new AuthService.
    ///
    /// Fails when the secret is empty, so a misconfigured process stops at
    /// startup instead of on the first login.
    pub fn new(jwt_secret: &str) -> Result<Self> {
        if jwt_secret.trim().is_empty() {
            return Err(AppError::Config("JWT secret must not be empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        })
    }

    /// Hashes a password using Argon2id.
    ///
    /// Returns a PHC-formatted hash string.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Verifies a password against an Argon2 hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Issues a session token for `user_id`, valid for six days from now.
    pub fn issue_token(&self, user_id: &str) -> Result<String> {
        self.issue_token_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_token_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            id: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + session_ttl()).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a session token and returns the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.verify_token_at(token, Utc::now())
    }

    /// Verifies signature and structure, then expiry against `now`.
    ///
    /// A token is accepted up to and including its `exp` second and rejected
    /// strictly after; no leeway is granted.
    pub fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

        if now.timestamp() > claims.exp {
            return Err(AppError::Auth("Token expired".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> AuthService {
        AuthService::new("test-secret-key-that-is-at-least-32-chars").expect("valid secret")
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(AuthService::new(""), Err(AppError::Config(_))));
        assert!(matches!(AuthService::new("   "), Err(AppError::Config(_))));
    }

    #[test]
    fn test_password_hashing() {
        let service = create_test_service();
        let password = "test_password_123";

        let hash = service
            .hash_password(password)
            .expect("should hash password");

        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2"), "hash should be in PHC format");
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let service = create_test_service();

        let first = service.hash_password("same").unwrap();
        let second = service.hash_password("same").unwrap();

        assert_ne!(first, second, "each hash should use a fresh salt");
    }

    #[test]
    fn test_password_verification() {
        let service = create_test_service();
        let hash = service.hash_password("correct_password").unwrap();

        assert!(service.verify_password("correct_password", &hash).unwrap());
        assert!(!service.verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_token_round_trip() {
        let service = create_test_service();

        let token = service.issue_token("user-456").expect("should issue token");
        let claims = service.verify_token(&token).expect("should verify token");

        assert_eq!(claims.id, "user-456");
        assert_eq!(claims.exp - claims.iat, 6 * 24 * 60 * 60);
    }

    #[test]
    fn test_token_lifetime_boundary() {
        let service = create_test_service();
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = service.issue_token_at("user", issued).unwrap();

        let last_valid = issued + session_ttl();
        assert!(service.verify_token_at(&token, issued).is_ok());
        assert!(service.verify_token_at(&token, last_valid).is_ok());
        assert!(service
            .verify_token_at(&token, last_valid + Duration::seconds(1))
            .is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = create_test_service();

        assert!(matches!(
            service.verify_token("invalid.token.here"),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let service1 = AuthService::new("secret-one-that-is-32-chars-long").unwrap();
        let service2 = AuthService::new("secret-two-that-is-32-chars-long").unwrap();

        let token = service1.issue_token("user-789").unwrap();

        assert!(service2.verify_token(&token).is_err());
    }
}
