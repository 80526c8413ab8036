//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use secrecy::SecretString;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::sync::SyncService;
use crate::domains::translation::TranslationService;
use crate::kernel::ServerDeps;
use crate::server::middleware::sync_auth_middleware;
use crate::server::routes::{
    agent_listings_handler, health_handler, list_listings_handler, listing_handler,
    search_listings_handler, sync_status_handler, translate_handler, trigger_sync_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub sync: Arc<SyncService>,
    pub translation: TranslationService,
    /// Bearer secret for `POST /api/sync`; the trigger is closed when unset
    pub sync_api_secret: Option<SecretString>,
}

impl AppState {
    pub fn new(sync: Arc<SyncService>, sync_api_secret: Option<SecretString>) -> Self {
        let deps = sync.deps().clone();
        let translation =
            TranslationService::new(deps.translator.clone(), deps.translation_store.clone());

        Self {
            deps,
            sync,
            translation,
            sync_api_secret,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let secret = state.sync_api_secret.clone();
    let trigger = post(trigger_sync_handler).layer(middleware::from_fn(move |req, next| {
        sync_auth_middleware(secret.clone(), req, next)
    }));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/sync", trigger.get(sync_status_handler))
        .route("/api/listings", get(list_listings_handler))
        .route("/api/listings/search", get(search_listings_handler))
        .route("/api/listings/agent", get(agent_listings_handler))
        .route("/api/listings/:id", get(listing_handler))
        .route("/api/translate", post(translate_handler))
        .layer(Extension(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
