// Admin module
// Dashboard, venue/event/user management and dataset import; admin role only

pub mod handlers;
pub mod models;

pub use models::{CreateUserRequest, DashboardResponse, UpdateUserRequest};
