use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::cafe;
use crate::error::AppError;
use crate::models::photo::PhotoResponse;
use crate::models::review::ReviewResponse;
use crate::rating::RatingSummary;

pub use super::shared::{Pagination, double_option, escape_like};

/// Fields accepted when creating a cafe. Parsed from multipart form data
/// (the photo file rides along in the same request), so this is built by
/// the handler rather than deserialized directly.
#[derive(Default)]
pub struct CreateCafeForm {
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub amenities: Vec<String>,
    /// Original filename and bytes of the required photo.
    pub photo: Option<(String, Vec<u8>)>,
}

pub struct ValidatedCafeForm {
    pub name: String,
    pub address: String,
    pub description: Option<String>,
    pub amenities: Vec<String>,
    pub photo_filename: String,
    pub photo_bytes: Vec<u8>,
}

pub fn validate_create_cafe(form: CreateCafeForm) -> Result<ValidatedCafeForm, AppError> {
    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Name, address, and photo are required".into()))?;
    let address = form
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::Validation("Name, address, and photo are required".into()))?;
    let (photo_filename, photo_bytes) = form
        .photo
        .ok_or_else(|| AppError::Validation("Name, address, and photo are required".into()))?;

    validate_name(name)?;
    validate_address(address)?;
    let description = match form.description.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(d) => {
            validate_description(d)?;
            Some(d.to_string())
        }
    };
    validate_amenities(&form.amenities)?;

    Ok(ValidatedCafeForm {
        name: name.to_string(),
        address: address.to_string(),
        description,
        amenities: form.amenities,
        photo_filename,
        photo_bytes,
    })
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCafeRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    /// Omit to leave unchanged, null to clear, value to set.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub amenities: Option<Vec<String>>,
}

pub fn validate_update_cafe(payload: &UpdateCafeRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name.trim())?;
    }
    if let Some(ref address) = payload.address {
        validate_address(address.trim())?;
    }
    if let Some(Some(ref description)) = payload.description {
        validate_description(description.trim())?;
    }
    if let Some(ref amenities) = payload.amenities {
        validate_amenities(amenities)?;
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name.chars().count() > 256 {
        return Err(AppError::Validation("Name must be 1-256 characters".into()));
    }
    Ok(())
}

pub fn validate_address(address: &str) -> Result<(), AppError> {
    if address.is_empty() || address.chars().count() > 512 {
        return Err(AppError::Validation(
            "Address must be 1-512 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), AppError> {
    if description.chars().count() > 2000 {
        return Err(AppError::Validation(
            "Description must be at most 2000 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_amenities(amenities: &[String]) -> Result<(), AppError> {
    if amenities.len() > 20 {
        return Err(AppError::Validation("At most 20 amenity tags".into()));
    }
    for tag in amenities {
        let tag = tag.trim();
        if tag.is_empty() || tag.chars().count() > 64 {
            return Err(AppError::Validation(
                "Amenity tags must be 1-64 characters".into(),
            ));
        }
    }
    Ok(())
}

/// Convert an amenity list to the JSON column representation.
pub fn amenities_to_json(amenities: &[String]) -> serde_json::Value {
    serde_json::Value::Array(
        amenities
            .iter()
            .map(|a| serde_json::Value::String(a.trim().to_string()))
            .collect(),
    )
}

/// Read the amenity list back out of the JSON column, dropping anything
/// that is not a string.
pub fn amenities_from_json(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Cafe as returned from create/update endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CafeResponse {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
    pub amenities: Vec<String>,
    pub average_rating: f64,
    pub user_id: Option<i32>,
    pub photos: Vec<PhotoResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CafeResponse {
    pub fn from_model(m: cafe::Model, photos: Vec<PhotoResponse>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            address: m.address,
            description: m.description,
            amenities: amenities_from_json(&m.amenities),
            average_rating: m.average_rating,
            user_id: m.user_id,
            photos,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Full cafe detail: photos, reviews with author emails, and the
/// per-dimension averages recomputed from the review set on every read.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CafeDetailResponse {
    #[serde(flatten)]
    pub cafe: CafeResponse,
    pub reviews: Vec<ReviewResponse>,
    pub averages: RatingSummary,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CafeListItem {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
    pub amenities: Vec<String>,
    pub average_rating: f64,
    pub review_count: u64,
    /// URL of the cafe's first photo, if any.
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CafeListResponse {
    pub data: Vec<CafeListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct CafeListQuery {
    /// 1-based page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 20, max 100).
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the cafe name.
    pub search: Option<String>,
    /// One of: created_at (default), name, average_rating.
    pub sort_by: Option<String>,
    /// asc or desc (default desc).
    pub sort_order: Option<String>,
}
