//! OpenAPI document, served at `/api/openapi.json`.

use crate::api::handlers::{articles, auth, categories, products, sliders};
use crate::types::{
    Article, ArticleRequest, Category, CategoryRef, ImageSlider, LoginRequest, Product,
    RegisterRequest, SessionResponse, StatusMessage, User,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `jwt` session cookie as a security scheme.
struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "jwt",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "jwt",
                "Session cookie set by POST /api/auth/register and POST /api/auth/login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SessionCookieAddon),
    info(
        title = "Storefront API",
        description = "Admin catalog API: articles, categories, products and image sliders."
    ),
    paths(
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        articles::create_article,
        articles::list_articles,
        articles::get_article,
        articles::update_article,
        articles::delete_article,
        categories::create_category,
        categories::list_categories,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        products::create_product,
        products::list_products,
        products::get_product,
        products::update_product,
        products::delete_product,
        sliders::create_slider,
        sliders::list_sliders,
        sliders::get_slider,
    ),
    components(schemas(
        User,
        SessionResponse,
        StatusMessage,
        RegisterRequest,
        LoginRequest,
        Article,
        ArticleRequest,
        Category,
        CategoryRef,
        Product,
        ImageSlider,
    )),
    tags(
        (name = "auth", description = "Admin bootstrap and cookie sessions"),
        (name = "articles", description = "Articles"),
        (name = "categories", description = "Product categories"),
        (name = "products", description = "Products"),
        (name = "sliders", description = "Home page image slider")
    )
)]
/// OpenAPI document for every `/api` route.
pub struct ApiDoc;
