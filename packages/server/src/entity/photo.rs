use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Either a local `/uploads/...` path or an external http(s) URL.
    pub url: String,

    pub cafe_id: i32,
    #[sea_orm(belongs_to, from = "cafe_id", to = "id")]
    pub cafe: HasOne<super::cafe::Entity>,

    /// NULL when the photo was attached by URL without an uploader record.
    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
