use crate::{
    api::form::FormData,
    auth::guard::AdminOnly,
    media::{stage_uploads, Folder},
    types::{AppError, ApiResponse, ImageSlider, Result},
    AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

/// Add an image to the slider
#[utoipa::path(
    post,
    path = "/api/imageSlider",
    request_body(content_type = "multipart/form-data", description = "`name` and one `image` file"),
    responses(
        (status = 201, description = "Slider image added", body = ImageSlider),
        (status = 400, description = "Name or image missing"),
        (status = 401, description = "Not an authenticated admin")
    ),
    security(("jwt" = [])),
    tag = "sliders"
)]
pub async fn create_slider(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<ImageSlider>>)> {
    let mut form = FormData::read(multipart).await?;

    let name = form
        .text("name")
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput("Please provide name".to_string()))?;
    let image = form
        .take_files("image")
        .into_iter()
        .next()
        .ok_or_else(|| AppError::InvalidInput("Please provide image".to_string()))?;

    let staged = stage_uploads(&state.images, &[image], Folder::Slider).await?;
    let url = staged.first_url()?;

    let slider = staged.persist(state.db.create_slider(&name, &url)).await?;

    tracing::info!(slider_id = %slider.id, admin_id = %admin.id, "slider image added");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Image added successfully", slider)),
    ))
}

/// List slider images
#[utoipa::path(
    get,
    path = "/api/imageSlider",
    responses((status = 200, description = "All slider images", body = [ImageSlider])),
    tag = "sliders"
)]
pub async fn list_sliders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ImageSlider>>>> {
    let sliders = state.db.list_sliders().await?;

    Ok(Json(ApiResponse::with_message(
        "Images fetched successfully",
        sliders,
    )))
}

/// Get one slider image
#[utoipa::path(
    get,
    path = "/api/imageSlider/{id}",
    params(("id" = String, Path, description = "Slider image id")),
    responses(
        (status = 200, description = "The slider image", body = ImageSlider),
        (status = 404, description = "Slider image not found")
    ),
    tag = "sliders"
)]
pub async fn get_slider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ImageSlider>>> {
    let slider = state
        .db
        .get_slider(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    Ok(Json(ApiResponse::with_message(
        "Image fetched successfully",
        slider,
    )))
}
