use std::collections::HashMap;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{cafe, photo, review, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::cafe::*;
use crate::models::photo::PhotoResponse;
use crate::models::review::ReviewResponse;
use crate::rating;
use crate::state::AppState;
use crate::utils::upload;

#[utoipa::path(
    post,
    path = "/",
    tag = "Cafes",
    operation_id = "createCafe",
    summary = "Create a new cafe with a photo",
    description = "Creates a cafe from multipart form data: `name`, `address`, optional `description`, repeatable `amenities` text fields, and a required `photo` image file. The photo is stored on disk and served under `/uploads`. Body limit: 16 MB.",
    request_body(content_type = "multipart/form-data", description = "Cafe fields plus the photo file"),
    responses(
        (status = 201, description = "Cafe created", body = CafeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "A cafe with this name already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_cafe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = CreateCafeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("name") => form.name = Some(read_text_field(field).await?),
            Some("address") => form.address = Some(read_text_field(field).await?),
            Some("description") => form.description = Some(read_text_field(field).await?),
            Some("amenities") => form.amenities.push(read_text_field(field).await?),
            Some("photo") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("Photo must be a file field".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read photo: {e}")))?;
                form.photo = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let form = validate_create_cafe(form)?;

    let url = upload::store_photo(
        &state.config.uploads.dir,
        &form.photo_filename,
        &form.photo_bytes,
    )
    .await?;

    let now = chrono::Utc::now();
    let txn = state.db.begin().await?;

    let new_cafe = cafe::ActiveModel {
        name: Set(form.name),
        address: Set(form.address),
        description: Set(form.description),
        amenities: Set(amenities_to_json(&form.amenities)),
        average_rating: Set(0.0),
        user_id: Set(Some(auth_user.user_id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let cafe = new_cafe.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A cafe with this name already exists".into())
        }
        _ => AppError::from(e),
    })?;

    let new_photo = photo::ActiveModel {
        url: Set(url),
        cafe_id: Set(cafe.id),
        user_id: Set(Some(auth_user.user_id)),
        created_at: Set(now),
        ..Default::default()
    };
    let photo = new_photo.insert(&txn).await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(CafeResponse::from_model(cafe, vec![photo.into()])),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Cafes",
    operation_id = "listCafes",
    summary = "List cafes with pagination and search",
    description = "Returns a paginated list of cafes with optional case-insensitive name search. Sortable by `created_at` (default, desc), `name`, or `average_rating`. Each item carries its first photo URL and review count.",
    params(CafeListQuery),
    responses(
        (status = 200, description = "List of cafes", body = CafeListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_cafes(
    State(state): State<AppState>,
    Query(query): Query<CafeListQuery>,
) -> Result<Json<CafeListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut select = cafe::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(cafe::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let sort_by = query.sort_by.as_deref().unwrap_or("created_at");
    let sort_order = if query.sort_order.as_deref() == Some("asc") {
        Order::Asc
    } else {
        Order::Desc
    };
    let sort_column = match sort_by {
        "created_at" => cafe::Column::CreatedAt,
        "name" => cafe::Column::Name,
        "average_rating" => cafe::Column::AverageRating,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: created_at, name, average_rating".into(),
            ));
        }
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let cafes = select
        .order_by(sort_column, sort_order)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = cafes.iter().map(|c| c.id).collect();
    let first_photos = first_photo_urls(&state.db, &ids).await?;
    let review_counts = review_counts(&state.db, &ids).await?;

    let data = cafes
        .into_iter()
        .map(|c| CafeListItem {
            photo_url: first_photos.get(&c.id).cloned(),
            review_count: review_counts.get(&c.id).copied().unwrap_or(0),
            id: c.id,
            name: c.name,
            address: c.address,
            description: c.description,
            amenities: amenities_from_json(&c.amenities),
            average_rating: c.average_rating,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
        .collect();

    Ok(Json(CafeListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Cafes",
    operation_id = "getCafe",
    summary = "Get a cafe with its photos, reviews, and rating summary",
    description = "Returns full cafe details. Reviews carry their author's email. The per-dimension averages are recomputed from the review set on every read; they are never cached.",
    params(("id" = i32, Path, description = "Cafe ID")),
    responses(
        (status = 200, description = "Cafe details", body = CafeDetailResponse),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_cafe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CafeDetailResponse>, AppError> {
    let cafe = find_cafe(&state.db, id).await?;

    let photos: Vec<PhotoResponse> = photo::Entity::find()
        .filter(photo::Column::CafeId.eq(id))
        .order_by_asc(photo::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let reviews = review::Entity::find()
        .filter(review::Column::CafeId.eq(id))
        .order_by_asc(review::Column::Id)
        .all(&state.db)
        .await?;

    let averages = rating::compute_all_averages(&reviews);
    let reviews = with_author_emails(&state.db, reviews).await?;

    Ok(Json(CafeDetailResponse {
        cafe: CafeResponse::from_model(cafe, photos),
        reviews,
        averages,
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Cafes",
    operation_id = "updateCafe",
    summary = "Update a cafe",
    description = "Partially updates a cafe using PATCH semantics. Only provided fields are modified; `description` supports omit/null/value. Cafes with a recorded creator may only be edited by that creator.",
    params(("id" = i32, Path, description = "Cafe ID")),
    request_body = UpdateCafeRequest,
    responses(
        (status = 200, description = "Cafe updated", body = CafeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the cafe's creator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "A cafe with this name already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_cafe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCafeRequest>,
) -> Result<Json<CafeResponse>, AppError> {
    validate_update_cafe(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_cafe_for_update(&txn, id).await?;
    require_ownership(&existing, &auth_user)?;

    let mut active: cafe::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ref address) = payload.address {
        active.address = Set(address.trim().to_string());
    }
    match payload.description {
        Some(Some(desc)) => active.description = Set(Some(desc.trim().to_string())),
        Some(None) => active.description = Set(None),
        None => {}
    }
    if let Some(ref amenities) = payload.amenities {
        active.amenities = Set(amenities_to_json(amenities));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A cafe with this name already exists".into())
        }
        _ => AppError::from(e),
    })?;
    txn.commit().await?;

    let photos: Vec<PhotoResponse> = photo::Entity::find()
        .filter(photo::Column::CafeId.eq(id))
        .order_by_asc(photo::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(CafeResponse::from_model(model, photos)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Cafes",
    operation_id = "deleteCafe",
    summary = "Delete a cafe",
    description = "Permanently deletes a cafe and cascade-deletes its reviews and photos. Cafes with a recorded creator may only be deleted by that creator.",
    params(("id" = i32, Path, description = "Cafe ID")),
    responses(
        (status = 204, description = "Cafe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the cafe's creator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Cafe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_cafe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let cafe = find_cafe_for_update(&txn, id).await?;
    require_ownership(&cafe, &auth_user)?;

    review::Entity::delete_many()
        .filter(review::Column::CafeId.eq(id))
        .exec(&txn)
        .await?;
    photo::Entity::delete_many()
        .filter(photo::Column::CafeId.eq(id))
        .exec(&txn)
        .await?;
    cafe::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body limit layer for cafe multipart routes (16MB).
pub fn cafe_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))
}

fn require_ownership(cafe: &cafe::Model, auth_user: &AuthUser) -> Result<(), AppError> {
    // Seeded cafes have no creator and stay editable by any signed-in user.
    if let Some(owner) = cafe.user_id
        && owner != auth_user.user_id
    {
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

pub(crate) async fn find_cafe<C: ConnectionTrait>(db: &C, id: i32) -> Result<cafe::Model, AppError> {
    cafe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cafe not found".into()))
}

/// Fetch a cafe under a `FOR UPDATE` row lock. Serializes every
/// read-modify-write of the denormalized average per cafe.
pub(crate) async fn find_cafe_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<cafe::Model, AppError> {
    use sea_orm::sea_query::LockType;
    cafe::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Cafe not found".into()))
}

/// Attach author emails to a set of reviews with one user query.
pub(crate) async fn with_author_emails<C: ConnectionTrait>(
    db: &C,
    reviews: Vec<review::Model>,
) -> Result<Vec<ReviewResponse>, AppError> {
    let user_ids: Vec<i32> = reviews.iter().map(|r| r.user_id).collect();
    let emails: HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Email)
        .into_tuple::<(i32, String)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(reviews
        .into_iter()
        .map(|r| {
            let email = emails.get(&r.user_id).cloned();
            ReviewResponse::from_model(r, email)
        })
        .collect())
}

async fn first_photo_urls(
    db: &DatabaseConnection,
    cafe_ids: &[i32],
) -> Result<HashMap<i32, String>, AppError> {
    let photos = photo::Entity::find()
        .filter(photo::Column::CafeId.is_in(cafe_ids.iter().copied()))
        .order_by_asc(photo::Column::Id)
        .all(db)
        .await?;

    let mut first: HashMap<i32, String> = HashMap::new();
    for p in photos {
        first.entry(p.cafe_id).or_insert(p.url);
    }
    Ok(first)
}

async fn review_counts(
    db: &DatabaseConnection,
    cafe_ids: &[i32],
) -> Result<HashMap<i32, u64>, AppError> {
    let rows: Vec<(i32, i64)> = review::Entity::find()
        .filter(review::Column::CafeId.is_in(cafe_ids.iter().copied()))
        .select_only()
        .column(review::Column::CafeId)
        .column_as(review::Column::Id.count(), "count")
        .group_by(review::Column::CafeId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|(id, n)| (id, n as u64)).collect())
}
