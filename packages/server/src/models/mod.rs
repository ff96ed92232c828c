pub mod auth;
pub mod cafe;
pub mod photo;
pub mod review;
pub mod shared;
