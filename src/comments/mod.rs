// Comment module

pub mod handlers;
pub mod models;

pub use models::{Comment, CreateCommentRequest, NewComment};
