use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::photo;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::cafe::find_cafe;
use crate::models::photo::{AddPhotoRequest, PhotoResponse, validate_photo_url};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Photos",
    operation_id = "addPhoto",
    summary = "Attach a photo URL to a cafe",
    description = "Records an additional photo for a cafe by URL, either an external http(s) image or a previously uploaded `/uploads/...` path.",
    params(("id" = i32, Path, description = "Cafe ID")),
    request_body = AddPhotoRequest,
    responses(
        (status = 201, description = "Photo added", body = PhotoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(cafe_id, user_id = auth_user.user_id))]
pub async fn add_photo(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(cafe_id): Path<i32>,
    AppJson(payload): AppJson<AddPhotoRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_photo_url(&payload.url)?;

    find_cafe(&state.db, cafe_id).await?;

    let new_photo = photo::ActiveModel {
        url: Set(payload.url.trim().to_string()),
        cafe_id: Set(cafe_id),
        user_id: Set(Some(auth_user.user_id)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_photo.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(PhotoResponse::from(model))))
}
