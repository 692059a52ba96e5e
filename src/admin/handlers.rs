use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use super::models::{CreateUserRequest, DashboardResponse, UpdateUserRequest};
use crate::auth::models::{normalize_username, UserChanges, UserResponse};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::events::handlers::event_page;
use crate::events::{CreateEventRequest, Event, EventPage, EventQueryParams, UpdateEventRequest};
use crate::seed::{import_dataset, ImportSummary, SeedError};
use crate::venues::{CreateVenueRequest, UpdateVenueRequest, Venue};
use crate::AppState;

fn parse_user_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found("User", raw))
}

/// Handler for GET /api/admin/dashboard
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Venue and event totals", body = DashboardResponse),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let venue_count = state.store.count_venues().await?;
    let event_count = state.store.count_events().await?;

    Ok(Json(DashboardResponse {
        venue_count,
        event_count,
    }))
}

/// Handler for POST /api/admin/venues
#[utoipa::path(
    post,
    path = "/api/admin/venues",
    request_body = CreateVenueRequest,
    responses(
        (status = 201, description = "Venue created", body = Venue),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Venue id already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_venue(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateVenueRequest>,
) -> Result<(StatusCode, Json<Venue>), ApiError> {
    tracing::debug!("Creating new venue: {}", payload.id);
    payload.validate()?;

    let venue = state.store.create_venue(&Venue::from(payload)).await?;

    tracing::info!("Successfully created venue with id: {}", venue.id);
    Ok((StatusCode::CREATED, Json(venue)))
}

/// Handler for PATCH /api/admin/venues/:id
#[utoipa::path(
    patch,
    path = "/api/admin/venues/{id}",
    params(("id" = String, Path, description = "Venue ID")),
    request_body = UpdateVenueRequest,
    responses(
        (status = 200, description = "Venue updated", body = Venue),
        (status = 404, description = "Venue not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateVenueRequest>,
) -> Result<Json<Venue>, ApiError> {
    tracing::debug!("Updating venue with id: {}", id);
    payload.validate()?;

    let venue = state
        .store
        .update_venue(&id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Venue", &id))?;

    tracing::info!("Successfully updated venue with id: {}", id);
    Ok(Json(venue))
}

/// Handler for DELETE /api/admin/venues/:id
/// Events, comments and favorites of the venue are left in place
#[utoipa::path(
    delete,
    path = "/api/admin/venues/{id}",
    params(("id" = String, Path, description = "Venue ID")),
    responses(
        (status = 204, description = "Venue deleted"),
        (status = 404, description = "Venue not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting venue with id: {}", id);

    if !state.store.delete_venue(&id).await? {
        return Err(ApiError::not_found("Venue", &id));
    }

    tracing::info!("Successfully deleted venue with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/admin/events
/// Same contract as GET /api/events
#[utoipa::path(
    get,
    path = "/api/admin/events",
    params(EventQueryParams),
    responses(
        (status = 200, description = "One page of events", body = EventPage),
        (status = 400, description = "Invalid query parameter")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_events(
    State(state): State<AppState>,
    params: Result<Query<EventQueryParams>, QueryRejection>,
) -> Result<Json<EventPage>, ApiError> {
    Ok(Json(event_page(&state, params).await?))
}

/// Handler for POST /api/admin/events
#[utoipa::path(
    post,
    path = "/api/admin/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid input data"),
        (status = 404, description = "Venue not found"),
        (status = 409, description = "Event id already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_event(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    tracing::debug!("Creating new event: {}", payload.id);
    payload.validate()?;

    let event = Event::from(payload);
    if state.store.find_venue(&event.venue_id).await?.is_none() {
        return Err(ApiError::not_found("Venue", &event.venue_id));
    }

    let event = state.store.create_event(&event).await?;

    tracing::info!("Successfully created event with id: {}", event.id);
    Ok((StatusCode::CREATED, Json(event)))
}

/// Handler for PATCH /api/admin/events/:id
#[utoipa::path(
    patch,
    path = "/api/admin/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 404, description = "Event or new venue not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    tracing::debug!("Updating event with id: {}", id);
    payload.validate()?;

    if let Some(venue_id) = payload.venue_id.as_deref().map(str::trim) {
        if state.store.find_venue(venue_id).await?.is_none() {
            return Err(ApiError::not_found("Venue", venue_id));
        }
    }

    let event = state
        .store
        .update_event(&id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Event", &id))?;

    tracing::info!("Successfully updated event with id: {}", id);
    Ok(Json(event))
}

/// Handler for DELETE /api/admin/events/:id
#[utoipa::path(
    delete,
    path = "/api/admin/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting event with id: {}", id);

    if !state.store.delete_event(&id).await? {
        return Err(ApiError::not_found("Event", &id));
    }

    tracing::info!("Successfully deleted event with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "All users", body = Vec<UserResponse>)),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Handler for POST /api/admin/users
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Username already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_user(
    State(state): State<AppState>,
    admin: AuthenticatedUser,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate()?;
    let username = normalize_username(&payload.username);
    let role = payload.role.unwrap_or_default();
    tracing::debug!("Admin {} creating user {} with role {}", admin.user_id, username, role);

    let password_hash = state.auth.passwords().hash_password(&payload.password)?;
    let user = state.store.create_user(&username, &password_hash, role).await?;

    tracing::info!("Successfully created user with id: {}", user.id);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Handler for PATCH /api/admin/users/:id
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    tracing::debug!("Updating user with id: {}", id);
    payload.validate()?;

    let password_hash = match payload.password.as_deref() {
        Some(password) => Some(state.auth.passwords().hash_password(password)?),
        None => None,
    };

    let user = state
        .store
        .update_user(
            id,
            UserChanges {
                role: payload.role,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    tracing::info!("Successfully updated user with id: {}", id);
    Ok(Json(UserResponse::from(user)))
}

/// Handler for DELETE /api/admin/users/:id
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_user_id(&id)?;
    tracing::debug!("Deleting user with id: {}", id);

    if !state.store.delete_user(id).await? {
        return Err(ApiError::not_found("User", id));
    }

    tracing::info!("Successfully deleted user with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/admin/import
/// Re-reads the dataset files and replaces all venues and events
#[utoipa::path(
    post,
    path = "/api/admin/import",
    responses(
        (status = 200, description = "Dataset imported", body = ImportSummary),
        (status = 403, description = "Import disabled or not an admin"),
        (status = 500, description = "Dataset files missing or invalid")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn import(State(state): State<AppState>) -> Result<Json<ImportSummary>, ApiError> {
    if !state.config.allow_import {
        return Err(ApiError::Forbidden("Dataset import is disabled".to_string()));
    }

    let summary = import_dataset(state.store.as_ref(), &state.config.dataset_dir)
        .await
        .map_err(|e| match e {
            SeedError::Store(store_error) => ApiError::from(store_error),
            other => ApiError::InternalError(other.to_string()),
        })?;

    Ok(Json(summary))
}
