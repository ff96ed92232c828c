use serde_json::json;

use crate::common::{FAKE_JPEG, TestApp, routes};

mod creation {
    use super::*;

    #[tokio::test]
    async fn authenticated_user_can_create_a_cafe_with_a_photo() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        let res = app
            .post_multipart_with_token(routes::CAFES, TestApp::cafe_form("The Daily Grind"), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "The Daily Grind");
        assert_eq!(res.body["average_rating"], 0.0);
        assert_eq!(res.body["photos"].as_array().unwrap().len(), 1);

        let photo_url = res.body["photos"][0]["url"].as_str().unwrap();
        assert!(photo_url.starts_with("/uploads/"), "got {photo_url}");
    }

    #[tokio::test]
    async fn uploaded_photo_is_served_back_under_uploads() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        let res = app
            .post_multipart_with_token(routes::CAFES, TestApp::cafe_form("Roast House"), &token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let photo_url = res.body["photos"][0]["url"].as_str().unwrap().to_string();

        let served = app
            .client
            .get(format!("http://{}{}", app.addr, photo_url))
            .send()
            .await
            .expect("Failed to fetch uploaded photo");
        assert_eq!(served.status().as_u16(), 200);
        assert_eq!(served.bytes().await.unwrap().as_ref(), FAKE_JPEG);
    }

    #[tokio::test]
    async fn anonymous_user_cannot_create_a_cafe() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart_without_token(routes::CAFES, TestApp::cafe_form("Sneaky Cafe"))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn missing_required_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        // No photo part at all.
        let form = reqwest::multipart::Form::new()
            .text("name", "No Photo Cafe")
            .text("address", "1 Test St");
        let res = app
            .post_multipart_with_token(routes::CAFES, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_image_photo_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        let form = reqwest::multipart::Form::new()
            .text("name", "Script Cafe")
            .text("address", "1 Test St")
            .part(
                "photo",
                reqwest::multipart::Part::bytes(b"<script>".to_vec())
                    .file_name("payload.html")
                    .mime_str("text/html")
                    .unwrap(),
            );
        let res = app
            .post_multipart_with_token(routes::CAFES, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_cafe_name_is_a_conflict() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        app.create_cafe(&token, "Twin Peaks Coffee").await;

        let res = app
            .post_multipart_with_token(routes::CAFES, TestApp::cafe_form("Twin Peaks Coffee"), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn cafes_are_listed_with_pagination() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        for name in ["Cafe Alpha", "Cafe Beta", "Cafe Gamma"] {
            app.create_cafe(&token, name).await;
        }

        let res = app
            .get(&format!("{}?page=1&per_page=2", routes::CAFES))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
    }

    #[tokio::test]
    async fn search_matches_names_case_insensitively() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        app.create_cafe(&token, "Morning Ritual").await;
        app.create_cafe(&token, "Nightcap Espresso").await;

        let res = app.get(&format!("{}?search=morning", routes::CAFES)).await;

        assert_eq!(res.status, 200);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["name"], "Morning Ritual");
    }

    #[tokio::test]
    async fn list_items_carry_first_photo_and_review_count() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        let cafe_id = app.create_cafe(&token, "Counted Cafe").await;
        app.create_review(cafe_id, &token, 4.0).await;
        app.create_review(cafe_id, &token, 5.0).await;

        let res = app.get(routes::CAFES).await;

        assert_eq!(res.status, 200);
        let item = &res.body["data"][0];
        assert_eq!(item["review_count"], 2);
        assert!(item["photo_url"].as_str().unwrap().starts_with("/uploads/"));
    }

    #[tokio::test]
    async fn unknown_sort_column_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(&format!("{}?sort_by=sneaky", routes::CAFES)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod detail {
    use super::*;

    #[tokio::test]
    async fn cafe_detail_includes_photos_reviews_and_averages() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        let cafe_id = app.create_cafe(&token, "Detail Cafe").await;
        app.create_review(cafe_id, &token, 4.0).await;

        let res = app.get(&routes::cafe(cafe_id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Detail Cafe");
        assert_eq!(res.body["photos"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["reviews"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["reviews"][0]["user_email"], "owner@example.com");
        assert_eq!(res.body["averages"]["overall"], 4.0);
        assert_eq!(res.body["average_rating"], 4.0);
    }

    #[tokio::test]
    async fn cafe_without_reviews_has_all_zero_averages() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;

        let cafe_id = app.create_cafe(&token, "Quiet Cafe").await;

        let res = app.get(&routes::cafe(cafe_id)).await;

        assert_eq!(res.status, 200);
        for dimension in ["overall", "location", "price", "coffee", "bakery"] {
            assert_eq!(res.body["averages"][dimension], 0.0, "{dimension}");
        }
    }

    #[tokio::test]
    async fn missing_cafe_is_a_404() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::cafe(999_999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn creator_can_patch_their_cafe() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;
        let cafe_id = app.create_cafe(&token, "Old Name").await;

        let res = app
            .patch_with_token(
                &routes::cafe(cafe_id),
                &json!({"name": "New Name", "amenities": ["wifi", "vegan options"]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "New Name");
        assert_eq!(res.body["amenities"], json!(["wifi", "vegan options"]));
    }

    #[tokio::test]
    async fn null_description_clears_the_field() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;
        let cafe_id = app.create_cafe(&token, "Wordy Cafe").await;

        let res = app
            .patch_with_token(&routes::cafe(cafe_id), &json!({"description": null}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["description"].is_null());
    }

    #[tokio::test]
    async fn non_creator_cannot_patch_someone_elses_cafe() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;
        let intruder = app
            .create_authenticated_user("intruder@example.com", "securepass")
            .await;
        let cafe_id = app.create_cafe(&owner, "Guarded Cafe").await;

        let res = app
            .patch_with_token(&routes::cafe(cafe_id), &json!({"name": "Mine Now"}), &intruder)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn renaming_to_an_existing_name_is_a_conflict() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;
        app.create_cafe(&token, "First Cafe").await;
        let second = app.create_cafe(&token, "Second Cafe").await;

        let res = app
            .patch_with_token(&routes::cafe(second), &json!({"name": "First Cafe"}), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn creator_can_delete_their_cafe_and_everything_cascades() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;
        let cafe_id = app.create_cafe(&token, "Doomed Cafe").await;
        app.create_review(cafe_id, &token, 3.0).await;

        let res = app.delete_with_token(&routes::cafe(cafe_id), &token).await;
        assert_eq!(res.status, 204);

        let gone = app.get(&routes::cafe(cafe_id)).await;
        assert_eq!(gone.status, 404);

        let reviews = app.get(&routes::reviews(cafe_id)).await;
        assert_eq!(reviews.status, 404);
    }

    #[tokio::test]
    async fn non_creator_cannot_delete_someone_elses_cafe() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_authenticated_user("owner@example.com", "securepass")
            .await;
        let intruder = app
            .create_authenticated_user("intruder@example.com", "securepass")
            .await;
        let cafe_id = app.create_cafe(&owner, "Guarded Cafe").await;

        let res = app.delete_with_token(&routes::cafe(cafe_id), &intruder).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod seeding {
    use super::*;

    #[tokio::test]
    async fn demo_seed_is_idempotent() {
        let app = TestApp::spawn().await;

        mycafe_server::seed::seed_demo_cafes(&app.db).await.unwrap();
        mycafe_server::seed::seed_demo_cafes(&app.db).await.unwrap();

        let res = app.get(routes::CAFES).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 3);

        // Seeded cafes carry no reviews, so their cached average starts at 0.
        for item in res.body["data"].as_array().unwrap() {
            assert_eq!(item["average_rating"], 0.0);
        }
    }
}
