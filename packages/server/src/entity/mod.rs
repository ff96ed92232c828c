pub mod cafe;
pub mod photo;
pub mod review;
pub mod user;
