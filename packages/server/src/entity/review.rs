use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A review is immutable once created: there is no edit or delete path,
/// so the cafe's cached average only ever has to absorb insertions.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub text: String,

    /// All ratings are stored as integers in [0, 5], rounded half-up
    /// from the submitted values before insertion.
    pub overall_rating: i32,
    pub location_rating: i32,
    pub price_rating: i32,
    pub coffee_rating: i32,
    pub bakery_rating: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub cafe_id: i32,
    #[sea_orm(belongs_to, from = "cafe_id", to = "id")]
    pub cafe: HasOne<super::cafe::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
