use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use super::models::{Comment, CreateCommentRequest, NewComment};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::AppState;

/// Handler for GET /api/comments/:venueId
/// Comments on a venue, newest first
#[utoipa::path(
    get,
    path = "/api/comments/{venueId}",
    params(("venueId" = String, Path, description = "Venue ID")),
    responses((status = 200, description = "Comments, newest first", body = Vec<Comment>)),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(venue_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    tracing::debug!("Fetching comments for venue: {}", venue_id);

    let comments = state.store.list_comments(&venue_id).await?;
    Ok(Json(comments))
}

/// Handler for POST /api/comments/:venueId
/// The body is validated before the venue is looked up; nothing is written for
/// an unknown venue
#[utoipa::path(
    post,
    path = "/api/comments/{venueId}",
    params(("venueId" = String, Path, description = "Venue ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment stored", body = Comment),
        (status = 400, description = "Comment empty or longer than 1000 characters"),
        (status = 404, description = "Venue not found", example = json!({"error": "Venue not found"}))
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn create_comment(
    State(state): State<AppState>,
    Path(venue_id): Path<String>,
    user: AuthenticatedUser,
    JsonBody(payload): JsonBody<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    tracing::debug!("User {} commenting on venue {}", user.user_id, venue_id);
    payload.validate()?;

    if state.store.find_venue(&venue_id).await?.is_none() {
        return Err(ApiError::not_found("Venue", &venue_id));
    }

    let comment = state
        .store
        .create_comment(NewComment {
            venue_id,
            user_id: user.user_id,
            username: user.username,
            text: payload.text,
        })
        .await?;

    tracing::info!("Successfully created comment with id: {}", comment.id);
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Handler for DELETE /api/comments/:commentId
/// Admin only
#[utoipa::path(
    delete,
    path = "/api/comments/{commentId}",
    params(("commentId" = i32, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Comment not found", example = json!({"error": "Comment not found"}))
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting comment with id: {}", comment_id);

    let id: i32 = comment_id
        .parse()
        .map_err(|_| ApiError::not_found("Comment", &comment_id))?;

    if !state.store.delete_comment(id).await? {
        return Err(ApiError::not_found("Comment", id));
    }

    tracing::info!("Successfully deleted comment with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}
