use sea_orm::*;
use serde_json::json;
use tracing::info;

use crate::entity::cafe;

/// Demo cafes inserted on startup when missing: (name, address, description, amenities).
const DEMO_CAFES: &[(&str, &str, &str, &[&str])] = &[
    (
        "The Cozy Corner",
        "123 Main St, Anytown",
        "A warm and inviting cafe with great coffee and pastries.",
        &["wifi", "outdoor seating"],
    ),
    (
        "Urban Brew",
        "456 Oak Ave, Cityville",
        "Modern cafe with specialty coffee and a vibrant atmosphere.",
        &["wifi", "power outlets"],
    ),
    (
        "Bean There, Done That",
        "789 Pine Ln, Townsville",
        "Quirky cafe known for its unique blends and friendly staff.",
        &["pet friendly"],
    ),
];

/// Seed the `cafe` table with demo entries, keyed by unique name.
///
/// Averages start at 0.0 because the seeded cafes carry no reviews; the
/// cached value must always equal the mean of the stored review set.
pub async fn seed_demo_cafes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now();
    let mut inserted = 0u32;

    for &(name, address, description, amenities) in DEMO_CAFES {
        let model = cafe::ActiveModel {
            name: Set(name.to_string()),
            address: Set(address.to_string()),
            description: Set(Some(description.to_string())),
            amenities: Set(json!(amenities)),
            average_rating: Set(0.0),
            user_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = cafe::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(cafe::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} demo cafes", inserted);
    }

    Ok(())
}
