use axum::{extract::Extension, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;

use crate::domains::sync::SyncError;
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// `POST /api/sync` runs a full sync and reports what it wrote.
pub async fn trigger_sync_handler(Extension(state): Extension<AppState>) -> Response {
    match state.sync.run().await {
        Ok(outcome) => Json(json!({
            "success": true,
            "message": "Sync completed successfully",
            "listingsSynced": outcome.listings_synced,
            "photosSynced": outcome.photos_synced,
            "brokerageScanComplete": outcome.brokerage_scan_complete,
        }))
        .into_response(),
        Err(SyncError::AlreadyRunning) => {
            ApiError::Conflict(SyncError::AlreadyRunning.to_string()).into_response()
        }
        Err(SyncError::Failed {
            message,
            listings_synced,
            photos_synced,
            ..
        }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": message,
                "listingsSynced": listings_synced,
                "photosSynced": photos_synced,
            })),
        )
            .into_response(),
    }
}

/// `GET /api/sync` returns the most recent run.
pub async fn sync_status_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let last_sync = state
        .sync
        .latest_run()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch sync status", e))?;

    Ok(Json(json!({ "lastSync": last_sync })))
}
