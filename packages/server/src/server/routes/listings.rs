use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domains::listings::{transform, ListingFilter, ListingView, TransformContext};
use crate::server::app::AppState;
use crate::server::error::ApiError;

const DEFAULT_LIMIT: i64 = 8;
const MAX_LIMIT: i64 = 100;
const SEARCH_LIMIT: i64 = 20;

/// Query string for `GET /api/listings`. Values that fail to parse are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsQuery {
    pub city: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub beds: Option<String>,
    pub baths: Option<String>,
    pub property_type: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
    /// Comma-separated MLS numbers
    pub exclude_ids: Option<String>,
}

fn parsed<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ListingsQuery {
    pub fn to_filter(&self) -> ListingFilter {
        ListingFilter {
            city: non_empty(&self.city),
            min_price: parsed(&self.min_price),
            max_price: parsed(&self.max_price),
            min_beds: parsed(&self.beds),
            min_baths: parsed(&self.baths),
            property_type: non_empty(&self.property_type),
            exclude_mls_numbers: self
                .exclude_ids
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
            offset: parsed::<i64>(&self.offset).unwrap_or(0).max(0),
            limit: parsed::<i64>(&self.limit)
                .unwrap_or(DEFAULT_LIMIT)
                .clamp(1, MAX_LIMIT),
        }
    }
}

/// `GET /api/listings`
pub async fn list_listings_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListingsQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = query.to_filter();
    let limit = filter.limit;

    // One extra row tells us whether another page exists
    let mut rows = state
        .deps
        .listing_store
        .find_for_sale(&ListingFilter {
            limit: limit + 1,
            ..filter.clone()
        })
        .await
        .map_err(|e| ApiError::internal("Failed to fetch listings", e))?;

    let has_more = rows.len() as i64 > limit;
    rows.truncate(limit as usize);
    let data: Vec<ListingView> = rows.into_iter().map(ListingView::from).collect();

    Ok(Json(json!({
        "success": true,
        "hasMore": has_more,
        "meta": {
            "count": data.len(),
            "offset": filter.offset,
            "limit": limit,
            "source": state.deps.storage_backend(),
        },
        "data": data,
    })))
}

/// MLS numbers to try for an identifier missing from the store.
///
/// Slugs end in the numeric part of the MLS number, which carries an `R` or
/// `F` prefix in the MLS.
pub fn mls_id_candidates(identifier: &str) -> Vec<String> {
    let digits: String = {
        let tail: Vec<char> = identifier
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        tail.into_iter().rev().collect()
    };

    let mut candidates = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if identifier.contains('-') && !digits.is_empty() {
        push(format!("R{}", digits));
        push(format!("F{}", digits));
    } else {
        push(identifier.to_string());
        if let Some(rest) = identifier.strip_prefix('R') {
            push(format!("F{}", rest));
        }
    }
    push(digits);

    candidates
}

/// `GET /api/listings/:id` by slug or MLS number, falling back to the live MLS.
pub async fn listing_handler(
    Extension(state): Extension<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deps = &state.deps;

    let stored = deps
        .listing_store
        .find_by_slug_or_mls_number(&identifier)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch listing", e))?;

    if let Some(listing) = stored {
        return Ok(Json(json!({
            "success": true,
            "data": ListingView::from(listing),
        })));
    }

    if !deps.mls.is_configured() {
        return Err(ApiError::NotFound("Listing not found".to_string()));
    }

    for candidate in mls_id_candidates(&identifier) {
        let Some(property) = deps.mls.listing_by_id(&candidate).await else {
            continue;
        };

        tracing::debug!(identifier = %identifier, mls_id = %candidate, "Listing served from MLS");

        let key = property.listing_key.clone();
        let photos = deps
            .mls
            .photos_for_listings(std::slice::from_ref(&key))
            .await
            .remove(&key)
            .unwrap_or_default();
        let listing = transform(&property, photos, TransformContext::now());

        return Ok(Json(json!({
            "success": true,
            "data": ListingView::from(listing),
        })));
    }

    Err(ApiError::NotFound("Listing not found".to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// `GET /api/listings/search?q=`
pub async fn search_listings_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(text) = non_empty(&query.q) else {
        return Err(ApiError::BadRequest("Search query is required".to_string()));
    };

    let rows = state
        .deps
        .listing_store
        .search(&text, SEARCH_LIMIT)
        .await
        .map_err(|e| ApiError::internal("Search failed", e))?;
    let data: Vec<ListingView> = rows.into_iter().map(ListingView::from).collect();

    Ok(Json(json!({
        "success": true,
        "meta": { "query": text, "count": data.len() },
        "data": data,
    })))
}

/// `GET /api/listings/agent`
pub async fn agent_listings_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let store = &state.deps.listing_store;

    let listings = store
        .agent_listings()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch agent listings", e))?;
    let featured = store
        .featured()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch agent listings", e))?;

    let listings: Vec<ListingView> = listings.into_iter().map(ListingView::from).collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "listings": listings,
            "featured": featured.map(ListingView::from),
        },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_candidates_try_both_prefixes() {
        assert_eq!(
            mls_id_candidates("123-ocean-blvd-jupiter-10999999"),
            vec!["R10999999", "F10999999", "10999999"]
        );
    }

    #[test]
    fn mls_number_candidates() {
        assert_eq!(
            mls_id_candidates("R10999999"),
            vec!["R10999999", "F10999999", "10999999"]
        );
        assert_eq!(mls_id_candidates("F123"), vec!["F123", "123"]);
        assert_eq!(mls_id_candidates("abc"), vec!["abc"]);
    }

    #[test]
    fn query_defaults_and_clamping() {
        let filter = ListingsQuery::default().to_filter();
        assert_eq!(filter.limit, 8);
        assert_eq!(filter.offset, 0);
        assert!(filter.exclude_mls_numbers.is_empty());

        let filter = ListingsQuery {
            limit: Some("500".into()),
            offset: Some("-3".into()),
            beds: Some("three".into()),
            baths: Some("2.5".into()),
            exclude_ids: Some("R1,,R2 ".into()),
            city: Some("  ".into()),
            ..Default::default()
        }
        .to_filter();

        assert_eq!(filter.limit, 100);
        assert_eq!(filter.offset, 0);
        assert_eq!(filter.min_beds, None);
        assert_eq!(filter.min_baths, Some(2.5));
        assert_eq!(filter.exclude_mls_numbers, vec!["R1", "R2"]);
        assert_eq!(filter.city, None);
    }
}
