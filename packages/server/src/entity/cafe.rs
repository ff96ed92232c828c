use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cafe")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub address: String,
    pub description: Option<String>,

    /// Amenity tags stored as a JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub amenities: serde_json::Value,

    /// Denormalized mean of the reviews' overall ratings; 0.0 with no reviews.
    /// Updated under a row lock in the same transaction as each review insert.
    pub average_rating: f64,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many)]
    pub photos: HasMany<super::photo::Entity>,

    /// NULL for seeded cafes that have no creator.
    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
