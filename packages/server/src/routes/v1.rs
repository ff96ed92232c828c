use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/cafes", cafe_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn cafe_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::cafe::list_cafes,
            handlers::cafe::create_cafe
        ))
        .routes(routes!(
            handlers::cafe::get_cafe,
            handlers::cafe::update_cafe,
            handlers::cafe::delete_cafe
        ))
        .nest("/{id}/reviews", review_routes())
        .nest("/{id}/photos", photo_routes())
        .layer(handlers::cafe::cafe_body_limit())
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::review::list_reviews,
        handlers::review::create_review
    ))
}

fn photo_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::photo::add_photo))
}
