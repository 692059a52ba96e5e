use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::events::Event;
use crate::validation::validate_not_blank;

/// A venue from the cultural-events dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Venue {
    /// External dataset key
    #[schema(example = "36310035")]
    pub id: String,
    #[schema(example = "Hong Kong Cultural Centre (Concert Hall)")]
    pub name: String,
    #[schema(example = 22.2937)]
    pub latitude: f64,
    #[schema(example = 114.1702)]
    pub longitude: f64,
}

/// Venue listing row with its number of events
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VenueSummary {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub event_count: i64,
}

/// GET /api/venues/:id body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VenueDetailResponse {
    pub venue: Venue,
    pub events: Vec<Event>,
}

/// Admin DTO for POST /api/admin/venues
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVenueRequest {
    #[validate(custom = "validate_not_blank")]
    pub id: String,
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
}

impl From<CreateVenueRequest> for Venue {
    fn from(request: CreateVenueRequest) -> Self {
        Self {
            id: request.id.trim().to_string(),
            name: request.name.trim().to_string(),
            latitude: request.latitude,
            longitude: request.longitude,
        }
    }
}

/// Admin DTO for PATCH /api/admin/venues/:id; omitted fields are kept
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVenueRequest {
    #[validate(custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
}
