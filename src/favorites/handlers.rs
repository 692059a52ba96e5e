use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use super::models::{AddFavoriteRequest, Favorite};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::AppState;

/// Handler for GET /api/favorites
/// The caller's favorites, newest first
#[utoipa::path(
    get,
    path = "/api/favorites",
    responses((status = 200, description = "Own favorites", body = Vec<Favorite>)),
    security(("bearer_auth" = [])),
    tag = "favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Favorite>>, ApiError> {
    tracing::debug!("Fetching favorites for user {}", user.user_id);

    let favorites = state.store.list_favorites(user.user_id).await?;
    Ok(Json(favorites))
}

/// Handler for POST /api/favorites
#[utoipa::path(
    post,
    path = "/api/favorites",
    request_body = AddFavoriteRequest,
    responses(
        (status = 201, description = "Favorite added", body = Favorite),
        (status = 400, description = "venueId missing"),
        (status = 404, description = "Venue not found"),
        (status = 409, description = "Venue already in favorites", example = json!({"error": "Venue already in favorites"}))
    ),
    security(("bearer_auth" = [])),
    tag = "favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(payload): JsonBody<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    payload.validate()?;
    let venue_id = payload.venue_id.trim();
    tracing::debug!("User {} adding favorite venue {}", user.user_id, venue_id);

    if state.store.find_venue(venue_id).await?.is_none() {
        return Err(ApiError::not_found("Venue", venue_id));
    }

    let favorite = state.store.create_favorite(user.user_id, venue_id).await?;

    tracing::info!("Successfully created favorite with id: {}", favorite.id);
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// Handler for DELETE /api/favorites/:id
/// Admins may delete any favorite; users only their own
#[utoipa::path(
    delete,
    path = "/api/favorites/{id}",
    params(("id" = i32, Path, description = "Favorite ID")),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 404, description = "Favorite not found", example = json!({"error": "Favorite not found"}))
    ),
    security(("bearer_auth" = [])),
    tag = "favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(favorite_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: i32 = favorite_id
        .parse()
        .map_err(|_| ApiError::not_found("Favorite", &favorite_id))?;

    let owner = if user.is_admin() { None } else { Some(user.user_id) };
    if !state.store.delete_favorite(id, owner).await? {
        return Err(ApiError::not_found("Favorite", id));
    }

    tracing::info!("User {} removed favorite {}", user.user_id, id);
    Ok(StatusCode::NO_CONTENT)
}
