use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_not_blank;
use crate::venues::Venue;

/// An event held at a venue
///
/// `venueid` references a venue by its dataset key; the reference is not
/// enforced, so an event may outlive its venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    #[schema(example = "173462")]
    pub id: String,
    #[schema(example = "Hong Kong Philharmonic: Mahler 5")]
    pub title: String,
    #[serde(rename = "venueid")]
    #[schema(example = "36310035")]
    pub venue_id: String,
    /// Free text, e.g. `1-30/11/2025`
    #[schema(example = "2025-11-14; 2025-11-15")]
    pub date: String,
    pub description: String,
    pub presenter: String,
}

/// Event listing row joined with its venue's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventListing {
    pub id: String,
    pub title: String,
    #[serde(rename = "venueid")]
    pub venue_id: String,
    pub date: String,
    pub description: String,
    pub presenter: String,
    /// `None` when the venue no longer exists
    pub venue_name: Option<String>,
}

impl EventListing {
    pub fn from_event(event: Event, venue_name: Option<String>) -> Self {
        Self {
            id: event.id,
            title: event.title,
            venue_id: event.venue_id,
            date: event.date,
            description: event.description,
            presenter: event.presenter,
            venue_name,
        }
    }
}

/// Paginated listing body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventPage {
    pub items: Vec<EventListing>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

/// GET /api/events/random body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RandomEventsResponse {
    pub items: Vec<EventListing>,
}

/// GET /api/events/:id body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventDetailResponse {
    pub event: Event,
    pub venue: Option<Venue>,
}

/// Admin DTO for POST /api/admin/events
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(custom = "validate_not_blank")]
    pub id: String,
    #[validate(custom = "validate_not_blank")]
    pub title: String,
    #[serde(rename = "venueid")]
    #[validate(custom = "validate_not_blank")]
    pub venue_id: String,
    #[validate(custom = "validate_not_blank")]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub presenter: String,
}

impl From<CreateEventRequest> for Event {
    fn from(request: CreateEventRequest) -> Self {
        Self {
            id: request.id.trim().to_string(),
            title: request.title.trim().to_string(),
            venue_id: request.venue_id.trim().to_string(),
            date: request.date.trim().to_string(),
            description: request.description,
            presenter: request.presenter,
        }
    }
}

/// Admin DTO for PATCH /api/admin/events/:id; omitted fields are kept
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEventRequest {
    #[validate(custom = "validate_not_blank")]
    pub title: Option<String>,
    #[serde(rename = "venueid")]
    #[validate(custom = "validate_not_blank")]
    pub venue_id: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub date: Option<String>,
    pub description: Option<String>,
    pub presenter: Option<String>,
}
