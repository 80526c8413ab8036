use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domains::translation::{Lang, PropertyText};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub texts: Option<Vec<String>>,
    pub property: Option<PropertyText>,
    pub target_lang: Option<String>,
}

/// `POST /api/translate`
///
/// `property` wins over `texts` when both are given.
pub async fn translate_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<Value>, ApiError> {
    let target: Lang = match request.target_lang.as_deref() {
        None => Lang::default(),
        Some(code) => code.parse().map_err(|_| {
            ApiError::BadRequest("Invalid target language. Use 'es' or 'en'".to_string())
        })?,
    };

    if target == Lang::En {
        return Ok(Json(match request.property {
            Some(property) => json!({ "property": property }),
            None => json!({ "translations": request.texts.unwrap_or_default() }),
        }));
    }

    if let Some(property) = request.property {
        let translated = state
            .translation
            .translate_property(property, target)
            .await
            .map_err(|e| ApiError::internal("Translation failed", e))?;
        return Ok(Json(json!({ "property": translated })));
    }

    if let Some(texts) = request.texts {
        let translations = state
            .translation
            .translate_batch(&texts, target)
            .await
            .map_err(|e| ApiError::internal("Translation failed", e))?;
        return Ok(Json(json!({ "translations": translations })));
    }

    Err(ApiError::BadRequest(
        "Provide either 'texts' array or 'property' object".to_string(),
    ))
}
