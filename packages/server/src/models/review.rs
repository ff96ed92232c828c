use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::review;
use crate::error::AppError;

/// Request body for submitting a review.
///
/// Ratings arrive as floats (a frontend may derive the overall rating from
/// the sub-ratings) and are rounded half-up to integers before storage.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    /// Free-text review body (1-2000 characters).
    #[schema(example = "Great flat white, friendly staff.")]
    pub text: String,
    /// Overall rating, required, in (0, 5].
    #[schema(example = 4.5)]
    pub overall_rating: f64,
    /// Sub-ratings in [0, 5]; absent values default to 0.
    #[serde(default)]
    pub location_rating: f64,
    #[serde(default)]
    pub price_rating: f64,
    #[serde(default)]
    pub coffee_rating: f64,
    #[serde(default)]
    pub bakery_rating: f64,
}

pub fn validate_create_review(payload: &CreateReviewRequest) -> Result<(), AppError> {
    let text = payload.text.trim();
    if text.is_empty() || text.chars().count() > 2000 {
        return Err(AppError::Validation(
            "Review text must be 1-2000 characters".into(),
        ));
    }
    if !payload.overall_rating.is_finite() || payload.overall_rating <= 0.0 {
        return Err(AppError::Validation(
            "Overall rating and text are required".into(),
        ));
    }
    if payload.overall_rating > 5.0 {
        return Err(AppError::Validation(
            "Overall rating must be at most 5".into(),
        ));
    }
    for (name, value) in [
        ("location_rating", payload.location_rating),
        ("price_rating", payload.price_rating),
        ("coffee_rating", payload.coffee_rating),
        ("bakery_rating", payload.bakery_rating),
    ] {
        if !value.is_finite() || !(0.0..=5.0).contains(&value) {
            return Err(AppError::Validation(format!(
                "{name} must be between 0 and 5"
            )));
        }
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub text: String,
    pub overall_rating: i32,
    pub location_rating: i32,
    pub price_rating: i32,
    pub coffee_rating: i32,
    pub bakery_rating: i32,
    pub user_id: i32,
    /// Email of the review's author.
    pub user_email: Option<String>,
    pub cafe_id: i32,
    pub created_at: DateTime<Utc>,
}

impl ReviewResponse {
    pub fn from_model(m: review::Model, user_email: Option<String>) -> Self {
        Self {
            id: m.id,
            text: m.text,
            overall_rating: m.overall_rating,
            location_rating: m.location_rating,
            price_rating: m.price_rating,
            coffee_rating: m.coffee_rating,
            bakery_rating: m.bakery_rating,
            user_id: m.user_id,
            user_email,
            cafe_id: m.cafe_id,
            created_at: m.created_at,
        }
    }
}
