use axum::{
    extract::{Path, State},
    response::Json,
};

use super::models::{VenueDetailResponse, VenueSummary};
use crate::error::ApiError;
use crate::AppState;

/// Handler for GET /api/venues
/// Lists every venue with its number of events, ordered by name
#[utoipa::path(
    get,
    path = "/api/venues",
    responses(
        (status = 200, description = "All venues", body = Vec<VenueSummary>),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = [])),
    tag = "venues"
)]
pub async fn list_venues(State(state): State<AppState>) -> Result<Json<Vec<VenueSummary>>, ApiError> {
    tracing::debug!("Fetching all venues");

    let venues = state.store.list_venues().await?;

    tracing::debug!("Retrieved {} venues", venues.len());
    Ok(Json(venues))
}

/// Handler for GET /api/venues/:id
/// Returns the venue together with its events
#[utoipa::path(
    get,
    path = "/api/venues/{id}",
    params(("id" = String, Path, description = "Venue ID")),
    responses(
        (status = 200, description = "Venue and its events", body = VenueDetailResponse),
        (status = 404, description = "Venue not found", example = json!({"error": "Venue not found"}))
    ),
    security(("bearer_auth" = [])),
    tag = "venues"
)]
pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VenueDetailResponse>, ApiError> {
    tracing::debug!("Fetching venue with id: {}", id);

    let venue = state
        .store
        .find_venue(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Venue", &id))?;
    let events = state.store.events_for_venue(&venue.id).await?;

    Ok(Json(VenueDetailResponse { venue, events }))
}
