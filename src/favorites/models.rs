use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_not_blank;

/// A venue bookmarked by a user; unique per (user, venue)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i32,
    pub user_id: i32,
    pub venue_id: String,
    pub created_at: DateTime<Utc>,
}

/// Body of POST /api/favorites
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "36310035")]
    pub venue_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_favorite_reads_camel_case() {
        let request: AddFavoriteRequest = serde_json::from_str(r#"{"venueId": "v1"}"#).unwrap();
        assert_eq!(request.venue_id, "v1");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_add_favorite_rejects_blank_venue() {
        let request = AddFavoriteRequest {
            venue_id: " ".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
