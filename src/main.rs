use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cultural_events_api::{
    auth::{AuthService, PasswordService, TokenService},
    config::Config,
    create_router, db, seed,
    store::{PgStore, Store},
    AppState,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging; RUST_LOG overrides the default filter
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Cultural Events API - Starting...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = Config::from_env().map_err(|e| format!("Invalid configuration: {}", e))?;

    let tokens = TokenService::new(&config.jwt_access_secret, &config.jwt_refresh_secret)
        .map_err(|e| format!("Invalid token configuration: {}", e))?
        .with_ttls(config.access_token_ttl, config.refresh_token_ttl);
    let passwords = PasswordService::new();

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url)
        .await
        .map_err(|e| format!("Failed to create database pool: {}", e))?;

    let pg_store = PgStore::new(pool);
    pg_store
        .run_migrations()
        .await
        .map_err(|e| format!("Failed to run database migrations: {}", e))?;
    let store: Arc<dyn Store> = Arc::new(pg_store);

    if config.auto_seed {
        seed::seed_users_if_needed(store.as_ref(), &passwords)
            .await
            .map_err(|e| format!("Failed to seed users: {}", e))?;
        seed::seed_dataset_if_needed(store.as_ref(), &config.dataset_dir)
            .await
            .map_err(|e| format!("Failed to seed dataset: {}", e))?;
    } else {
        tracing::info!("AUTO_SEED disabled, skipping seeding");
    }

    let addr = config.bind_address;
    let auth = AuthService::new(store.clone(), tokens, passwords);
    let app = create_router(AppState::new(store, auth, config));

    // Start the Axum server
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!("Cultural Events API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))
}
