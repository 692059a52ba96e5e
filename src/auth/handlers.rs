// HTTP handlers for authentication endpoints

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::auth::{
    cookie::{read_refresh_token, RefreshCookie},
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, UserResponse},
    service::IssuedSession,
};
use crate::extract::JsonBody;
use crate::AppState;

fn refresh_cookie(state: &AppState) -> RefreshCookie {
    RefreshCookie::new(state.config.secure_cookies)
}

fn session_response(state: &AppState, status: StatusCode, session: IssuedSession) -> Response {
    let cookie = refresh_cookie(state).set(&session.refresh_token, state.auth.tokens().refresh_ttl());
    (status, [(header::SET_COOKIE, cookie)], Json(session.response)).into_response()
}

/// Login with username and password
/// POST /api/users/login
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in; refresh token set in the rtk cookie", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "users"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Response, AuthError> {
    tracing::debug!("POST /api/users/login");
    request.validate()?;

    let session = state.auth.login(&request).await?;
    Ok(session_response(&state, StatusCode::OK, session))
}

/// Register a new account with role `user`
/// POST /api/users/register
#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username already taken")
    ),
    tag = "users"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Response, AuthError> {
    tracing::debug!("POST /api/users/register");
    request.validate()?;

    let session = state.auth.register(&request).await?;
    Ok(session_response(&state, StatusCode::CREATED, session))
}

/// Exchange the refresh cookie for a new access token
/// POST /api/users/refresh
///
/// A rejected cookie is cleared in the same response.
#[utoipa::path(
    post,
    path = "/api/users/refresh",
    responses(
        (status = 200, description = "New access token", body = AuthResponse),
        (status = 401, description = "Missing or invalid refresh token")
    ),
    tag = "users"
)]
pub async fn refresh_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = read_refresh_token(&headers) else {
        return AuthError::MissingRefreshToken.into_response();
    };

    match state.auth.refresh(&token) {
        Ok(response) => Json(response).into_response(),
        Err(error) => {
            let cookie = refresh_cookie(&state).clear();
            ([(header::SET_COOKIE, cookie)], error).into_response()
        }
    }
}

/// Clear the refresh cookie
/// POST /api/users/logout
#[utoipa::path(
    post,
    path = "/api/users/logout",
    responses((status = 204, description = "Signed out")),
    tag = "users"
)]
pub async fn logout_handler(State(state): State<AppState>) -> Response {
    let cookie = refresh_cookie(&state).clear();
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response()
}

/// Profile of the signed-in user
/// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    tracing::debug!("GET /api/users/me for user_id={}", user.user_id);
    let profile = state.auth.me(user.user_id).await?;
    Ok(Json(profile))
}

/// Change the signed-in user's password
/// POST /api/users/change-password
#[utoipa::path(
    post,
    path = "/api/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Validation error or unchanged password"),
        (status = 401, description = "Current password is incorrect")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    tracing::debug!("POST /api/users/change-password for user_id={}", user.user_id);
    request.validate()?;

    state.auth.change_password(user.user_id, &request).await?;
    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}
