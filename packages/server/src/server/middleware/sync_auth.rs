use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::server::error::ApiError;

/// Guard for the sync trigger.
///
/// Requires `Authorization: Bearer <secret>`. With no secret configured every
/// request is rejected.
pub async fn sync_auth_middleware(
    secret: Option<SecretString>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_authorized(&request, secret.as_ref()) {
        debug!("Rejected sync trigger");
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}

fn is_authorized(request: &Request<Body>, secret: Option<&SecretString>) -> bool {
    let Some(secret) = secret else {
        return false;
    };

    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret.expose_secret())
}
