use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::photo;
use crate::error::AppError;

/// Request body for attaching an existing image URL to a cafe.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddPhotoRequest {
    /// An http(s) URL or a local `/uploads/...` path.
    #[schema(example = "/uploads/1735689600000-3f2a.jpg")]
    pub url: String,
}

pub fn validate_photo_url(url: &str) -> Result<(), AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("Image URL is required".into()));
    }
    if url.len() > 2048 {
        return Err(AppError::Validation(
            "Image URL must be at most 2048 characters".into(),
        ));
    }
    let allowed = url.starts_with("http://")
        || url.starts_with("https://")
        || (url.starts_with("/uploads/") && !url.contains(".."));
    if !allowed {
        return Err(AppError::Validation(
            "Image URL must be http(s) or a local /uploads path".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PhotoResponse {
    pub id: i32,
    pub url: String,
    pub cafe_id: i32,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<photo::Model> for PhotoResponse {
    fn from(m: photo::Model) -> Self {
        Self {
            id: m.id,
            url: m.url,
            cafe_id: m.cafe_id,
            user_id: m.user_id,
            created_at: m.created_at,
        }
    }
}
