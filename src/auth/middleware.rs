// Authentication middleware for protected routes

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{error::AuthError, models::Role, token::Claims};
use crate::AppState;

/// Identity attached to a request by [`authenticate`]
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Handlers take the identity placed in the request extensions by `authenticate`
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Extracts the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MissingToken)?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MissingToken),
    }
}

/// Validates the bearer access token and attaches the identity to the request
///
/// The header shape is checked before any signature work. Expired and
/// tampered tokens produce the same rejection.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let token = bearer_token(request.headers()).map_err(|e| {
        warn!("Missing or malformed Authorization header for endpoint: {}", endpoint);
        e
    })?;

    let claims = state.auth.tokens().verify_access_token(token)?;
    debug!(
        "Authenticated user_id={}, role={}, endpoint={}",
        claims.sub, claims.role, endpoint
    );

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims));
    Ok(next.run(request).await)
}

/// Authorization check that requires one of a fixed set of roles
///
/// Runs after `authenticate`; a request without an attached identity is
/// treated as unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct RequireRole {
    allowed: &'static [Role],
}

impl RequireRole {
    /// Create a RequireRole check accepting any of the given roles
    pub const fn any_of(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Admins only
    pub const fn admin() -> Self {
        Self::any_of(&[Role::Admin])
    }

    /// Any signed-in user
    pub const fn member() -> Self {
        Self::any_of(&[Role::User, Role::Admin])
    }

    /// Validate an (optional) identity against the allowed roles
    pub fn check(&self, user: Option<&AuthenticatedUser>) -> Result<(), AuthError> {
        let user = user.ok_or(AuthError::Unauthenticated)?;

        if !self.allowed.contains(&user.role) {
            return Err(AuthError::InsufficientPermissions {
                allowed: self.allowed,
                actual: user.role,
            });
        }
        Ok(())
    }

    /// Middleware function that validates role-based access
    pub async fn middleware(self, request: Request, next: Next) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();
        let user = request.extensions().get::<AuthenticatedUser>();

        if let Err(e) = self.check(user) {
            warn!("Authorization failed for endpoint {}: {}", endpoint, e);
            return Err(e);
        }

        debug!("Authorization successful for endpoint: {}", endpoint);
        Ok(next.run(request).await)
    }
}

/// `from_fn` entry point for admin-only routes
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AuthError> {
    RequireRole::admin().middleware(request, next).await
}

/// `from_fn` entry point for routes open to every signed-in role
pub async fn require_member(request: Request, next: Next) -> Result<Response, AuthError> {
    RequireRole::member().middleware(request, next).await
}
