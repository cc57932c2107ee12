//! Article handlers. Articles are plain documents without uploads, sent as
//! JSON or urlencoded forms.

use super::{lenient_body, non_blank};
use crate::{
    auth::guard::AdminOnly,
    types::{AppError, ApiResponse, Article, ArticleRequest, Result},
    AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

fn clean_tags(tags: Option<Vec<String>>) -> Option<Vec<String>> {
    tags.map(|tags| {
        tags.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    })
}

/// Create an article
#[utoipa::path(
    post,
    path = "/api/article",
    request_body = ArticleRequest,
    responses(
        (status = 201, description = "Article created", body = Article),
        (status = 400, description = "Title or description missing"),
        (status = 401, description = "Not an authenticated admin")
    ),
    security(("jwt" = [])),
    tag = "articles"
)]
pub async fn create_article(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<Article>>)> {
    let payload: ArticleRequest = lenient_body(&headers, &body);
    let (Some(title), Some(description)) = (non_blank(payload.title), non_blank(payload.description))
    else {
        return Err(AppError::InvalidInput(
            "Please provide title and description".to_string(),
        ));
    };
    let tag = clean_tags(payload.tag).unwrap_or_default();

    let article = state.db.create_article(&title, &description, &tag).await?;

    tracing::info!(article_id = %article.id, admin_id = %admin.id, "article created");

    Ok((StatusCode::CREATED, Json(ApiResponse::data(article))))
}

/// List all articles
#[utoipa::path(
    get,
    path = "/api/article",
    responses((status = 200, description = "All articles", body = [Article])),
    tag = "articles"
)]
pub async fn list_articles(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Article>>>> {
    let articles = state.db.list_articles().await?;
    Ok(Json(ApiResponse::data(articles)))
}

/// Get one article
#[utoipa::path(
    get,
    path = "/api/article/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "The article", body = Article),
        (status = 404, description = "Article not found")
    ),
    tag = "articles"
)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Article>>> {
    let article = state
        .db
        .get_article(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    Ok(Json(ApiResponse::data(article)))
}

/// Update an article's title, description or tags
#[utoipa::path(
    put,
    path = "/api/article/{id}",
    params(("id" = String, Path, description = "Article id")),
    request_body = ArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = Article),
        (status = 400, description = "Neither title nor description given"),
        (status = 404, description = "Article not found")
    ),
    security(("jwt" = [])),
    tag = "articles"
)]
pub async fn update_article(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<Article>>> {
    let payload: ArticleRequest = lenient_body(&headers, &body);
    let title = non_blank(payload.title);
    let description = non_blank(payload.description);

    if title.is_none() && description.is_none() {
        return Err(AppError::InvalidInput(
            "Please provide title or description".to_string(),
        ));
    }
    let tag = clean_tags(payload.tag);

    let article = state
        .db
        .update_article(&id, title.as_deref(), description.as_deref(), tag.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    tracing::info!(article_id = %article.id, admin_id = %admin.id, "article updated");

    Ok(Json(ApiResponse::with_message(
        "Article updated successfully",
        article,
    )))
}

/// Delete an article
#[utoipa::path(
    delete,
    path = "/api/article/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted"),
        (status = 404, description = "Article not found")
    ),
    security(("jwt" = [])),
    tag = "articles"
)]
pub async fn delete_article(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    if !state.db.delete_article(&id).await? {
        return Err(AppError::NotFound("Article not found".to_string()));
    }

    tracing::info!(article_id = %id, admin_id = %admin.id, "article deleted");

    Ok(Json(ApiResponse::message("Article deleted successfully")))
}
