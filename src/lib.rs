pub mod admin;
pub mod auth;
pub mod comments;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod extract;
pub mod favorites;
pub mod meta;
pub mod seed;
pub mod store;
pub mod validation;
pub mod venues;

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{authenticate, require_admin, require_member, AuthService};
use config::Config;
use store::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<AuthService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: AuthService, config: Config) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
            config: Arc::new(config),
        }
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::login_handler,
        auth::handlers::register_handler,
        auth::handlers::refresh_handler,
        auth::handlers::logout_handler,
        auth::handlers::me_handler,
        auth::handlers::change_password_handler,
        venues::handlers::list_venues,
        venues::handlers::get_venue,
        events::handlers::list_events,
        events::handlers::random_events,
        events::handlers::get_event,
        comments::handlers::list_comments,
        comments::handlers::create_comment,
        comments::handlers::delete_comment,
        favorites::handlers::list_favorites,
        favorites::handlers::add_favorite,
        favorites::handlers::remove_favorite,
        meta::get_meta,
        admin::handlers::dashboard,
        admin::handlers::create_venue,
        admin::handlers::update_venue,
        admin::handlers::delete_venue,
        admin::handlers::list_events,
        admin::handlers::create_event,
        admin::handlers::update_event,
        admin::handlers::delete_event,
        admin::handlers::list_users,
        admin::handlers::create_user,
        admin::handlers::update_user,
        admin::handlers::delete_user,
        admin::handlers::import,
    ),
    components(
        schemas(
            auth::models::Role,
            auth::models::SessionUser,
            auth::models::UserResponse,
            auth::models::CredentialsRequest,
            auth::models::ChangePasswordRequest,
            auth::models::AuthResponse,
            auth::models::MessageResponse,
            venues::Venue,
            venues::VenueSummary,
            venues::VenueDetailResponse,
            venues::CreateVenueRequest,
            venues::UpdateVenueRequest,
            events::Event,
            events::EventListing,
            events::EventPage,
            events::RandomEventsResponse,
            events::EventDetailResponse,
            events::CreateEventRequest,
            events::UpdateEventRequest,
            comments::Comment,
            comments::CreateCommentRequest,
            favorites::Favorite,
            favorites::AddFavoriteRequest,
            meta::MetaResponse,
            admin::DashboardResponse,
            admin::CreateUserRequest,
            admin::UpdateUserRequest,
            seed::ImportSummary,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Sign-in, tokens and profile"),
        (name = "venues", description = "Cultural venues"),
        (name = "events", description = "Events held at the venues"),
        (name = "comments", description = "Venue comments"),
        (name = "favorites", description = "Bookmarked venues"),
        (name = "meta", description = "Dataset freshness"),
        (name = "admin", description = "Administration, admin role only")
    ),
    info(
        title = "Cultural Events API",
        version = "1.0.0",
        description = "REST API for browsing cultural venues and events"
    )
)]
pub struct ApiDoc;

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

/// Last-resort answer for a handler that panicked
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

fn cors_layer(client_url: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(client_url).unwrap_or_else(|_| {
        tracing::warn!("CLIENT_URL '{}' is not a valid origin, using default", client_url);
        HeaderValue::from_static("http://localhost:3000")
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Creates and configures the application router
///
/// Sign-in routes are public. Every other route runs `authenticate` and then
/// the role check for its group; comment deletion adds an admin check.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/users/login", post(auth::login_handler))
        .route("/api/users/register", post(auth::register_handler))
        .route("/api/users/refresh", post(auth::refresh_handler))
        .route("/api/users/logout", post(auth::logout_handler));

    let members = Router::new()
        .route("/api/users/me", get(auth::me_handler))
        .route("/api/users/change-password", post(auth::change_password_handler))
        .route("/api/venues", get(venues::handlers::list_venues))
        .route("/api/venues/:id", get(venues::handlers::get_venue))
        .route("/api/events", get(events::handlers::list_events))
        .route("/api/events/random", get(events::handlers::random_events))
        .route("/api/events/:id", get(events::handlers::get_event))
        .route(
            "/api/comments/:id",
            get(comments::handlers::list_comments)
                .post(comments::handlers::create_comment)
                .merge(delete(comments::handlers::delete_comment).route_layer(from_fn(require_admin))),
        )
        .route(
            "/api/favorites",
            get(favorites::handlers::list_favorites).post(favorites::handlers::add_favorite),
        )
        .route("/api/favorites/:id", delete(favorites::handlers::remove_favorite))
        .route("/api/meta", get(meta::get_meta))
        .route_layer(from_fn(require_member))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let admins = Router::new()
        .route("/api/admin/dashboard", get(admin::handlers::dashboard))
        .route("/api/admin/venues", post(admin::handlers::create_venue))
        .route(
            "/api/admin/venues/:id",
            patch(admin::handlers::update_venue).delete(admin::handlers::delete_venue),
        )
        .route(
            "/api/admin/events",
            get(admin::handlers::list_events).post(admin::handlers::create_event),
        )
        .route(
            "/api/admin/events/:id",
            patch(admin::handlers::update_event).delete(admin::handlers::delete_event),
        )
        .route(
            "/api/admin/users",
            get(admin::handlers::list_users).post(admin::handlers::create_user),
        )
        .route(
            "/api/admin/users/:id",
            patch(admin::handlers::update_user).delete(admin::handlers::delete_user),
        )
        .route("/api/admin/import", post(admin::handlers::import))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let routes = Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // API routes
        .merge(public)
        .merge(members)
        .merge(admins);

    with_middleware(routes, &state.config).with_state(state)
}

/// Fallback, tracing, CORS and panic recovery shared by every route
fn with_middleware(routes: Router<AppState>, config: &Config) -> Router<AppState> {
    routes.fallback(route_not_found).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.client_url))
            .layer(CatchPanicLayer::custom(panic_response)),
    )
}
