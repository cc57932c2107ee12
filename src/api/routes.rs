use crate::api::{diagnostics, doc::ApiDoc, handlers};
use crate::media::{MAX_IMAGE_BYTES, MAX_PRODUCT_IMAGES};
use crate::types::AppError;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    http::{
        header::{self, HeaderName, HeaderValue},
        Method, Uri,
    },
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Body limit for routes that accept image uploads.
pub const UPLOAD_BODY_LIMIT: usize = MAX_PRODUCT_IMAGES * MAX_IMAGE_BYTES + 1024 * 1024;

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/me", get(auth::me))
}

fn article_routes() -> Router<AppState> {
    use handlers::articles;

    Router::new()
        .route(
            "/",
            get(articles::list_articles).post(articles::create_article),
        )
        .route("/create", post(articles::create_article))
        .route(
            "/{id}",
            get(articles::get_article)
                .put(articles::update_article)
                .delete(articles::delete_article),
        )
}

fn category_routes() -> Router<AppState> {
    use handlers::categories;

    Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

fn product_routes() -> Router<AppState> {
    use handlers::products;

    Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

fn slider_routes() -> Router<AppState> {
    use handlers::sliders;

    Router::new()
        .route(
            "/",
            get(sliders::list_sliders).post(sliders::create_slider),
        )
        .route("/{id}", get(sliders::get_slider))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Routes under `/api`. Plural and kebab-case aliases share handlers.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/article", article_routes())
        .nest("/articles", article_routes())
        .nest("/category", category_routes())
        .nest("/categories", category_routes())
        .nest("/product", product_routes())
        .nest("/products", product_routes())
        .nest("/imageSlider", slider_routes())
        .nest("/image-slider", slider_routes())
        .route("/openapi.json", get(openapi_json))
        .fallback(not_found)
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn health() -> &'static str {
    "OK"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Not Found - {}", uri.path()))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

fn security_headers<S: Clone>(router: Router<S>) -> Router<S>
where
    S: Send + Sync + 'static,
{
    let headers = [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::REFERRER_POLICY, "no-referrer"),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            "same-origin",
        ),
    ];

    headers.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ))
    })
}

/// Full application router with state applied.
///
/// Anything that is neither an API route nor a file in the public directory
/// gets the JSON not-found response.
pub fn create_router(state: AppState) -> Router {
    let public = ServeDir::new(&state.config.server.public_dir)
        .not_found_service(not_found.into_service());

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .fallback_service(public)
        .layer(middleware::map_response_with_state(
            state.clone(),
            diagnostics::expose_error_detail,
        ));

    security_headers(router)
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_security_headers_keep_handler_values() {
        let router: Router = Router::new().route(
            "/",
            get(|| async { ([(header::X_FRAME_OPTIONS, "DENY")], "ok") }),
        );

        let response = security_headers(router)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(
            response.headers()["cross-origin-resource-policy"],
            "same-origin"
        );
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let origins = vec![
            "http://localhost:3000".to_string(),
            "bad\norigin".to_string(),
        ];
        let router: Router = Router::new()
            .route("/", post(|| async { "ok" }))
            .layer(cors_layer(&origins));

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[test]
    fn test_upload_limit_fits_a_full_product_form() {
        assert!(UPLOAD_BODY_LIMIT > MAX_PRODUCT_IMAGES * MAX_IMAGE_BYTES);
    }
}
