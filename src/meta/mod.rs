// Dataset metadata

use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    /// Time of the last dataset import; null before the first one
    pub last_updated: Option<DateTime<Utc>>,
}

/// Handler for GET /api/meta
#[utoipa::path(
    get,
    path = "/api/meta",
    responses((status = 200, description = "Dataset freshness", body = MetaResponse)),
    security(("bearer_auth" = [])),
    tag = "meta"
)]
pub async fn get_meta(State(state): State<AppState>) -> Result<Json<MetaResponse>, ApiError> {
    let last_updated = state.store.dataset_last_updated().await?;
    Ok(Json(MetaResponse { last_updated }))
}
