use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Account Types =============

/// A persisted account. The password hash never leaves the process.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_admin: bool,
}

/// Account fields accepted by the admin bootstrap, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

// ============= Catalog Types =============

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub tag: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

/// Category reference as embedded in product responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
}

/// Product row as stored; categories are kept as ids.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Vec<String>,
    pub category: Vec<String>,
    pub tag: Vec<String>,
    pub hot: bool,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product as returned by the API, with categories populated.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Vec<String>,
    pub category: Vec<CategoryRef>,
    pub tag: Vec<String>,
    pub hot: bool,
    #[serde(rename = "new")]
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageSlider {
    pub id: String,
    pub name: String,
    pub image: String,
}

/// Product list filter, already resolved to a category id.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub name: Option<String>,
}

// ============= API Request/Response Types =============

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ArticleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// A list, or a single comma-separated string
    #[serde(default, deserialize_with = "one_or_many")]
    pub tag: Option<Vec<String>>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|tags| match tags {
        OneOrMany::One(joined) => joined.split(',').map(str::to_string).collect(),
        OneOrMany::Many(tags) => tags,
    }))
}

/// Query string accepted by `GET /api/product`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ProductQuery {
    /// Category id or case-insensitive category name
    pub category: Option<String>,
    /// Case-insensitive product name fragment
    pub name: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<String>,
    /// Page size (default 10)
    pub limit: Option<String>,
}

/// Body written when a session is issued or the current user is fetched.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub status: String,
    pub data: User,
}

impl SessionResponse {
    pub fn success(user: User) -> Self {
        Self {
            status: "success".to_string(),
            data: user,
        }
    }
}

/// Body written on logout.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

/// Envelope for resource controller responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_product: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub success: bool,
    pub message: String,
    pub data: Vec<Product>,
    pub pagination: Pagination,
}

/// Signed session token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Authorization error: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Image host error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::Forbidden(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_)
            | AppError::Database(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show any caller. Server-side faults stay generic.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg)
            | AppError::Conflict(msg)
            | AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::Upstream(_) => "Image upload failed".to_string(),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Diagnostic detail attached to error responses.
///
/// The body carries `"stack": null`; `api::diagnostics` swaps the detail in
/// when the service is not running in production.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub detail: String,
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = self.public_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "message": message,
            "stack": serde_json::Value::Null,
        });

        let mut response = (status, axum::Json(body)).into_response();
        response.extensions_mut().insert(ErrorReport {
            message,
            detail: self.to_string(),
        });
        response
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidInput(format!("Invalid form data: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(format!("Invalid query string: {}", rejection.body_text()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Conflict("Admin already exists".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Forbidden("Not authorized as admin".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Upstream("timeout".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = AppError::Database("no such table: users".into());
        assert_eq!(err.public_message(), "Internal server error");

        let response = err.into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report should be attached");
        assert!(report.detail.contains("no such table"));
    }

    #[test]
    fn test_user_serialization_omits_password() {
        let user = User {
            id: "u1".into(),
            name: "A".into(),
            email: "a@x.com".into(),
            phone: "1".into(),
            password_hash: "$argon2id$secret".into(),
            is_admin: true,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["isAdmin"], true);
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }
}
