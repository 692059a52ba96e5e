use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_not_blank;

pub const MAX_COMMENT_LENGTH: u64 = 1000;

/// A user's comment on a venue
///
/// `username` is a snapshot taken when the comment is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub venue_id: String,
    pub user_id: i32,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Body of POST /api/comments/:venueId
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(
        length(min = 1, max = 1000, message = "Comment must be between 1 and 1000 characters"),
        custom = "validate_not_blank"
    )]
    #[schema(example = "Great acoustics, arrive early for parking.")]
    pub text: String,
}

/// Comment ready to be stored
#[derive(Debug, Clone)]
pub struct NewComment {
    pub venue_id: String,
    pub user_id: i32,
    pub username: String,
    pub text: String,
}
