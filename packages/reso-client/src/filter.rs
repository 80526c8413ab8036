//! OData query construction for `Property` searches.

use crate::types::{ListingSearchParams, PROPERTY_SELECT};

pub(crate) const DEFAULT_PAGE_SIZE: u32 = 20;
pub(crate) const DEFAULT_ORDER_BY: &str = "OnMarketDate desc";

/// Quote a string literal for an OData `$filter` expression.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build the `$filter` expression for a listing search.
///
/// Status defaults to `Active`; every other clause is optional.
pub fn build_filter(params: &ListingSearchParams) -> String {
    let mut filters = Vec::new();

    let status = params.status.as_deref().unwrap_or("Active");
    filters.push(format!("StandardStatus eq {}", quote(status)));

    if let Some(city) = &params.city {
        filters.push(format!("City eq {}", quote(city)));
    }
    if let Some(min) = params.min_price {
        filters.push(format!("ListPrice ge {}", min));
    }
    if let Some(max) = params.max_price {
        filters.push(format!("ListPrice le {}", max));
    }
    if let Some(beds) = params.beds {
        filters.push(format!("BedroomsTotal ge {}", beds));
    }
    if let Some(baths) = params.baths {
        filters.push(format!("BathroomsTotalInteger ge {}", baths));
    }
    if let Some(property_type) = &params.property_type {
        filters.push(format!("PropertyType eq {}", quote(property_type)));
    }
    if let Some(agent_key) = &params.agent_key {
        filters.push(format!("ListAgentKey eq {}", quote(agent_key)));
    }

    filters.join(" and ")
}

/// Full query-string pairs for a `Property` search.
pub fn build_query(params: &ListingSearchParams) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("$filter", build_filter(params)),
        (
            "$top",
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string(),
        ),
    ];

    if let Some(offset) = params.offset.filter(|o| *o > 0) {
        query.push(("$skip", offset.to_string()));
    }

    query.push((
        "$orderby",
        params
            .sort
            .clone()
            .unwrap_or_else(|| DEFAULT_ORDER_BY.to_string()),
    ));
    query.push(("$select", PROPERTY_SELECT.join(",")));
    query
}

/// `$filter` for the free-text search: active listings whose city or address contains `text`.
pub fn search_filter(text: &str) -> String {
    let quoted = quote(text);
    format!(
        "StandardStatus eq 'Active' and (contains(City,{q}) or contains(UnparsedAddress,{q}))",
        q = quoted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_active_only() {
        let filter = build_filter(&ListingSearchParams::default());
        assert_eq!(filter, "StandardStatus eq 'Active'");
    }

    #[test]
    fn filters_combine_with_and() {
        let params = ListingSearchParams {
            city: Some("Jupiter".into()),
            min_price: Some(500000.0),
            max_price: Some(2000000.0),
            beds: Some(3),
            baths: Some(2),
            property_type: Some("Residential".into()),
            agent_key: Some("AGENT123".into()),
            ..Default::default()
        };

        assert_eq!(
            build_filter(&params),
            "StandardStatus eq 'Active' and City eq 'Jupiter' and ListPrice ge 500000 \
             and ListPrice le 2000000 and BedroomsTotal ge 3 and BathroomsTotalInteger ge 2 \
             and PropertyType eq 'Residential' and ListAgentKey eq 'AGENT123'"
        );
    }

    #[test]
    fn quotes_are_escaped() {
        let params = ListingSearchParams {
            city: Some("Port St. Lucie's".into()),
            ..Default::default()
        };
        assert!(build_filter(&params).contains("City eq 'Port St. Lucie''s'"));
    }

    #[test]
    fn query_defaults() {
        let query = build_query(&ListingSearchParams::default());
        let get = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        };

        assert_eq!(get("$top").as_deref(), Some("20"));
        assert_eq!(get("$orderby").as_deref(), Some("OnMarketDate desc"));
        assert_eq!(get("$skip"), None);
        assert!(get("$select").unwrap().starts_with("ListingKey,ListingId"));
    }

    #[test]
    fn query_pagination_and_sort() {
        let params = ListingSearchParams {
            limit: Some(500),
            offset: Some(1000),
            sort: Some("ListPrice desc".into()),
            ..Default::default()
        };
        let query = build_query(&params);
        assert!(query.contains(&("$top", "500".to_string())));
        assert!(query.contains(&("$skip", "1000".to_string())));
        assert!(query.contains(&("$orderby", "ListPrice desc".to_string())));
    }

    #[test]
    fn search_filter_matches_city_or_address() {
        assert_eq!(
            search_filter("Palm"),
            "StandardStatus eq 'Active' and (contains(City,'Palm') or contains(UnparsedAddress,'Palm'))"
        );
    }
}
