// Favorite venues module

pub mod handlers;
pub mod models;

pub use models::{AddFavoriteRequest, Favorite};
