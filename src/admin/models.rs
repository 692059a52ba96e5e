use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::models::Role;

/// GET /api/admin/dashboard body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub venue_count: i64,
    pub event_count: i64,
}

/// Body of POST /api/admin/users; role defaults to `user`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be between 3 and 64 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Body of PATCH /api/admin/users/:id; omitted fields are kept
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    pub password: Option<String>,
}
