//! Product handlers.
//!
//! Create and update take a multipart form: `name`, `description`,
//! `category` and `tag` as comma-separated lists, optional `hot`, and up to
//! five `image` files. Listing supports filtering by category (id or name)
//! and product name, with page/limit pagination.

use crate::{
    api::form::FormData,
    auth::guard::AdminOnly,
    media::{stage_uploads, Folder, ImageFile, MAX_PRODUCT_IMAGES},
    types::{
        AppError, ApiResponse, Pagination, Product, ProductFilter, ProductPage, ProductQuery,
        ProductRecord, Result,
    },
    AppState,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use uuid::Uuid;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;

/// Positive integer from a query value, or `default`.
fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn check_image_count(files: &[ImageFile]) -> Result<()> {
    if files.len() > MAX_PRODUCT_IMAGES {
        return Err(AppError::InvalidInput(format!(
            "A product can have at most {} images",
            MAX_PRODUCT_IMAGES
        )));
    }
    Ok(())
}

async fn check_categories(state: &AppState, ids: &[String]) -> Result<()> {
    let missing = state.db.missing_categories(ids).await?;
    if !missing.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Unknown category: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/product",
    request_body(
        content_type = "multipart/form-data",
        description = "`name`, `description`, `category` (comma list of ids), `tag` (comma list), optional `hot`, 1-5 `image` files"
    ),
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Missing field, unknown category, or image rejected"),
        (status = 401, description = "Not an authenticated admin")
    ),
    security(("jwt" = [])),
    tag = "products"
)]
pub async fn create_product(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>)> {
    let mut form = FormData::read(multipart).await?;

    let name = form
        .text("name")
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput("Please provide name".to_string()))?;
    let description = form
        .text("description")
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput("Please provide description".to_string()))?;

    let category = form.list("category");
    if category.is_empty() {
        return Err(AppError::InvalidInput("Please provide category".to_string()));
    }

    let tag = form.list("tag");
    if tag.is_empty() {
        return Err(AppError::InvalidInput("Please provide tag".to_string()));
    }

    let hot = form.flag("hot")?.unwrap_or(false);

    let files = form.take_files("image");
    if files.is_empty() {
        return Err(AppError::InvalidInput("Please provide image".to_string()));
    }
    check_image_count(&files)?;
    check_categories(&state, &category).await?;

    let staged = stage_uploads(&state.images, &files, Folder::Product).await?;

    let now = Utc::now();
    let record = ProductRecord {
        id: Uuid::new_v4().to_string(),
        name,
        description,
        image: staged.urls(),
        category,
        tag,
        hot,
        is_new: true,
        created_at: now,
        updated_at: now,
    };

    let product = staged.persist(state.db.insert_product(record)).await?;

    tracing::info!(
        product_id = %product.id,
        admin_id = %admin.id,
        images = product.image.len(),
        "product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Product successfully created",
            product,
        )),
    ))
}

/// List products with filtering and pagination
#[utoipa::path(
    get,
    path = "/api/product",
    params(ProductQuery),
    responses(
        (status = 200, description = "One page of products", body = [Product]),
        (status = 404, description = "Unknown category name, page out of range, or no products")
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ProductQuery>, AppError>,
) -> Result<Json<ProductPage>> {
    let mut filter = ProductFilter::default();

    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let resolved = match state.db.get_category(category).await? {
            Some(found) => found,
            None => state
                .db
                .find_category_by_name(category)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Category with name '{}' not found.", category))
                })?,
        };
        filter.category_id = Some(resolved.id);
    }

    filter.name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let page = positive_or(query.page.as_deref(), DEFAULT_PAGE);
    let limit = positive_or(query.limit.as_deref(), DEFAULT_LIMIT);

    let total_product = state.db.count_products(&filter).await?;
    let total_pages = total_product.div_ceil(limit);

    if page > total_pages {
        return Err(AppError::NotFound("This page does not exist.".to_string()));
    }

    let offset = (page - 1).saturating_mul(limit);
    let products = state.db.list_products(&filter, limit, offset).await?;

    if products.is_empty() {
        return Err(AppError::NotFound("No products found".to_string()));
    }

    Ok(Json(ProductPage {
        success: true,
        message: "Products fetched successfully".to_string(),
        data: products,
        pagination: Pagination {
            total_product,
            total_pages,
            current_page: page,
            limit,
        },
    }))
}

/// Get one product with its categories
#[utoipa::path(
    get,
    path = "/api/product/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = Product),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Product>>> {
    let product = state
        .db
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ApiResponse::with_message(
        "Product fetched successfully",
        product,
    )))
}

/// Update a product
///
/// `name`, `description` and `hot` replace the stored values when given.
/// Categories, tags and uploaded images are appended.
#[utoipa::path(
    put,
    path = "/api/product/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body(content_type = "multipart/form-data", description = "Any product fields; lists are appended"),
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Unknown category or image rejected"),
        (status = 404, description = "Product not found")
    ),
    security(("jwt" = [])),
    tag = "products"
)]
pub async fn update_product(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<Json<ApiResponse<Product>>> {
    let mut form = FormData::read(multipart).await?;

    let mut record = state
        .db
        .get_product_record(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let new_categories = form.list("category");
    check_categories(&state, &new_categories).await?;

    let files = form.take_files("image");
    check_image_count(&files)?;

    if let Some(name) = form.text("name") {
        record.name = name.to_string();
    }
    if let Some(description) = form.text("description") {
        record.description = description.to_string();
    }
    if let Some(hot) = form.flag("hot")? {
        record.hot = hot;
    }
    record.category.extend(new_categories);
    record.tag.extend(form.list("tag"));

    let staged = if files.is_empty() {
        None
    } else {
        Some(stage_uploads(&state.images, &files, Folder::Product).await?)
    };
    if let Some(staged) = &staged {
        record.image.extend(staged.urls());
    }

    let write = async {
        state
            .db
            .save_product(record)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    };

    let product = match staged {
        Some(staged) => staged.persist(write).await?,
        None => write.await?,
    };

    tracing::info!(product_id = %product.id, admin_id = %admin.id, "product updated");

    Ok(Json(ApiResponse::with_message(
        "Product updated successfully",
        product,
    )))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/product/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found")
    ),
    security(("jwt" = [])),
    tag = "products"
)]
pub async fn delete_product(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    if !state.db.delete_product(&id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    tracing::info!(product_id = %id, admin_id = %admin.id, "product deleted");

    Ok(Json(ApiResponse::message("Product deleted successfully")))
}
