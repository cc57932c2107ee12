//! Category handlers. Writes take a multipart form with `name` and one `image`.

use crate::{
    api::form::FormData,
    auth::guard::AdminOnly,
    media::{stage_uploads, Folder, ImageFile},
    types::{AppError, ApiResponse, Category, Result},
    AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

/// Name and image from a category form, or the first missing one as an error.
fn category_fields(mut form: FormData) -> Result<(String, ImageFile)> {
    let name = form
        .text("name")
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput("Category name is required".to_string()))?;

    let image = form
        .take_files("image")
        .into_iter()
        .next()
        .ok_or_else(|| AppError::InvalidInput("Image is required".to_string()))?;

    Ok((name, image))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/category",
    request_body(content_type = "multipart/form-data", description = "`name` and one `image` file"),
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Name or image missing, or image rejected"),
        (status = 401, description = "Not an authenticated admin")
    ),
    security(("jwt" = [])),
    tag = "categories"
)]
pub async fn create_category(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>)> {
    let (name, image) = category_fields(FormData::read(multipart).await?)?;

    let staged = stage_uploads(&state.images, &[image], Folder::Category).await?;
    let url = staged.first_url()?;

    let category = staged
        .persist(state.db.create_category(&name, &url))
        .await?;

    tracing::info!(category_id = %category.id, admin_id = %admin.id, "category created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Category created successfully",
            category,
        )),
    ))
}

/// List all categories
#[utoipa::path(
    get,
    path = "/api/category",
    responses(
        (status = 200, description = "All categories", body = [Category]),
        (status = 404, description = "No categories exist")
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let categories = state.db.list_categories().await?;

    if categories.is_empty() {
        return Err(AppError::NotFound("No categories found".to_string()));
    }

    Ok(Json(ApiResponse::with_message(
        "Categories fetched successfully",
        categories,
    )))
}

/// Get one category
#[utoipa::path(
    get,
    path = "/api/category/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "The category", body = Category),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = state
        .db
        .get_category(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(ApiResponse::with_message(
        "Category fetched successfully",
        category,
    )))
}

/// Replace a category's name and image
#[utoipa::path(
    put,
    path = "/api/category/{id}",
    params(("id" = String, Path, description = "Category id")),
    request_body(content_type = "multipart/form-data", description = "`name` and one `image` file"),
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Name or image missing"),
        (status = 404, description = "Category not found")
    ),
    security(("jwt" = [])),
    tag = "categories"
)]
pub async fn update_category(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<Json<ApiResponse<Category>>> {
    let (name, image) = category_fields(FormData::read(multipart).await?)?;

    if state.db.get_category(&id).await?.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let staged = stage_uploads(&state.images, &[image], Folder::Category).await?;
    let url = staged.first_url()?;

    let category = staged
        .persist(async {
            state
                .db
                .update_category(&id, &name, &url)
                .await?
                .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
        })
        .await?;

    tracing::info!(category_id = %category.id, admin_id = %admin.id, "category updated");

    Ok(Json(ApiResponse::with_message(
        "Category updated successfully",
        category,
    )))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/category/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found")
    ),
    security(("jwt" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    if !state.db.delete_category(&id).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    tracing::info!(category_id = %id, admin_id = %admin.id, "category deleted");

    Ok(Json(ApiResponse::message("Category deleted successfully")))
}
