use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::models::{EventDetailResponse, EventPage, RandomEventsResponse};
use super::query::{EventQueryParams, QueryValidator};
use crate::error::ApiError;
use crate::AppState;

/// Number of events returned by the random pick
pub const RANDOM_EVENT_COUNT: u32 = 3;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RandomEventsParams {
    /// Restrict the pick to one venue
    pub venueid: Option<String>,
}

/// Validates the query string and runs the listing
///
/// Shared by the public and the admin event listing.
pub(crate) async fn event_page(
    state: &AppState,
    params: Result<Query<EventQueryParams>, QueryRejection>,
) -> Result<EventPage, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::debug!("Listing events with query parameters: {:?}", params);

    let query = QueryValidator::validate(params).map_err(|e| ApiError::BadRequest(e.message))?;
    let (items, total) = state.store.list_events(&query).await?;

    tracing::debug!("Query returned {} of {} events", items.len(), total);
    Ok(EventPage {
        items,
        total,
        limit: query.limit,
        offset: query.offset,
    })
}

/// Handler for GET /api/events
/// Supports venue, title, presenter and date filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/events",
    params(EventQueryParams),
    responses(
        (status = 200, description = "One page of events", body = EventPage),
        (status = 400, description = "Invalid query parameter", example = json!({"error": "limit must be between 1 and 100"}))
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    params: Result<Query<EventQueryParams>, QueryRejection>,
) -> Result<Json<EventPage>, ApiError> {
    Ok(Json(event_page(&state, params).await?))
}

/// Handler for GET /api/events/random
/// Up to three randomly sampled events
#[utoipa::path(
    get,
    path = "/api/events/random",
    params(RandomEventsParams),
    responses((status = 200, description = "Random events", body = RandomEventsResponse)),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn random_events(
    State(state): State<AppState>,
    Query(params): Query<RandomEventsParams>,
) -> Result<Json<RandomEventsResponse>, ApiError> {
    let venue_id = params
        .venueid
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    tracing::debug!("Picking random events, venue filter: {:?}", venue_id);

    let items = state.store.random_events(venue_id, RANDOM_EVENT_COUNT).await?;
    Ok(Json(RandomEventsResponse { items }))
}

/// Handler for GET /api/events/:id
/// The venue is null when the event's venue no longer exists
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event and its venue", body = EventDetailResponse),
        (status = 404, description = "Event not found", example = json!({"error": "Event not found"}))
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventDetailResponse>, ApiError> {
    tracing::debug!("Fetching event with id: {}", id);

    let event = state
        .store
        .find_event(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event", &id))?;
    let venue = state.store.find_venue(&event.venue_id).await?;

    Ok(Json(EventDetailResponse { event, venue }))
}
