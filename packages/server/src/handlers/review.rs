use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{cafe, review};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::cafe::{find_cafe, find_cafe_for_update, with_author_emails};
use crate::models::review::{CreateReviewRequest, ReviewResponse, validate_create_review};
use crate::rating;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Reviews",
    operation_id = "listReviews",
    summary = "List a cafe's reviews",
    description = "Returns all reviews for a cafe in insertion order, each carrying its author's email.",
    params(("id" = i32, Path, description = "Cafe ID")),
    responses(
        (status = 200, description = "List of reviews", body = Vec<ReviewResponse>),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(cafe_id))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(cafe_id): Path<i32>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    find_cafe(&state.db, cafe_id).await?;

    let reviews = review::Entity::find()
        .filter(review::Column::CafeId.eq(cafe_id))
        .order_by_asc(review::Column::Id)
        .all(&state.db)
        .await?;

    let reviews = with_author_emails(&state.db, reviews).await?;
    Ok(Json(reviews))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Submit a review for a cafe",
    description = "Creates a review and updates the cafe's cached average rating in the same transaction. Submitted ratings are rounded half-up to integers before storage; the cafe row is locked so concurrent submissions serialize and every contribution lands in the average.",
    params(("id" = i32, Path, description = "Cafe ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(cafe_id, user_id = auth_user.user_id))]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(cafe_id): Path<i32>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_review(&payload)?;

    let txn = state.db.begin().await?;

    // Lock the cafe row first. The read-compute-write of the cached
    // average below must not interleave with another submission.
    let locked_cafe = find_cafe_for_update(&txn, cafe_id).await?;

    let existing: Vec<i32> = review::Entity::find()
        .filter(review::Column::CafeId.eq(cafe_id))
        .select_only()
        .column(review::Column::OverallRating)
        .into_tuple::<i32>()
        .all(&txn)
        .await?;

    let new_review = review::ActiveModel {
        text: Set(payload.text.trim().to_string()),
        overall_rating: Set(rating::round_half_up(payload.overall_rating)),
        location_rating: Set(rating::round_half_up(payload.location_rating)),
        price_rating: Set(rating::round_half_up(payload.price_rating)),
        coffee_rating: Set(rating::round_half_up(payload.coffee_rating)),
        bakery_rating: Set(rating::round_half_up(payload.bakery_rating)),
        user_id: Set(auth_user.user_id),
        cafe_id: Set(cafe_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_review.insert(&txn).await?;

    let new_average = rating::recompute_average(&existing, payload.overall_rating);

    let mut active: cafe::ActiveModel = locked_cafe.into();
    active.average_rating = Set(new_average);
    active.update(&txn).await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse::from_model(model, Some(auth_user.email))),
    ))
}
