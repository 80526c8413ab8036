//! MLS `Property` record -> stored [`Listing`].
//!
//! Pure: everything time-dependent comes in through [`TransformContext`].
//! Zero numbers and empty strings from the MLS are treated as missing.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use reso_client::ResoProperty;

use super::format::{format_lot_size, format_parking, format_price, format_sqft};
use super::models::listing::{Listing, ListingStatus, PropertyType};

/// Served in place of photos when a listing has none.
pub const NO_IMAGE_PLACEHOLDER: &str = "/images/no-image-placeholder.svg";

pub const DEFAULT_CITY: &str = "Palm Beach County";
pub const DEFAULT_STATE: &str = "FL";
pub const DEFAULT_DESCRIPTION: &str = "Contact agent for more details.";

const MAX_FEATURES: usize = 12;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9-]").expect("valid regex");
}

#[derive(Debug, Clone, Copy)]
pub struct TransformContext {
    /// Fallback for a missing `YearBuilt`
    pub current_year: i32,
    /// Fallback for a missing listed date
    pub today: NaiveDate,
    pub synced_at: DateTime<Utc>,
    pub is_agent_listing: bool,
    pub is_brokerage_listing: bool,
}

impl TransformContext {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            current_year: instant.year(),
            today: instant.date_naive(),
            synced_at: instant,
            is_agent_listing: false,
            is_brokerage_listing: false,
        }
    }

    pub fn with_flags(mut self, is_agent_listing: bool, is_brokerage_listing: bool) -> Self {
        self.is_agent_listing = is_agent_listing;
        self.is_brokerage_listing = is_brokerage_listing;
        self
    }
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn number(value: Option<f64>) -> Option<f64> {
    value.filter(|n| *n != 0.0 && !n.is_nan())
}

fn slug_part(value: &str) -> String {
    WHITESPACE.replace_all(&value.to_lowercase(), "-").into_owned()
}

/// `{type}-{street}-{city}-{listing id}`, restricted to `[a-z0-9-]`.
///
/// The listing id is appended as-is before filtering, so its uppercase
/// letters are dropped (`RX-10999999` contributes `-10999999`).
pub fn generate_slug(property: &ResoProperty) -> String {
    let mut parts: Vec<String> = [
        text(&property.property_type),
        text(&property.street_name),
        text(&property.city),
    ]
    .into_iter()
    .flatten()
    .map(slug_part)
    .collect();

    parts.push(
        text(&property.listing_id)
            .unwrap_or(&property.listing_key)
            .to_string(),
    );

    NON_SLUG.replace_all(&parts.join("-"), "").into_owned()
}

pub fn map_status(standard_status: Option<&str>) -> ListingStatus {
    let status = standard_status.unwrap_or_default().to_lowercase();

    if status.contains("pending") || status.contains("under contract") {
        ListingStatus::Pending
    } else if status.contains("sold") || status.contains("closed") {
        ListingStatus::Sold
    } else {
        ListingStatus::ForSale
    }
}

pub fn map_property_type(property_type: Option<&str>, sub_type: Option<&str>) -> PropertyType {
    let kind = property_type.unwrap_or_default().to_lowercase();
    let sub = sub_type.unwrap_or_default().to_lowercase();

    if kind.contains("condo") || sub.contains("condo") {
        PropertyType::Condo
    } else if kind.contains("townhouse") || sub.contains("townhouse") || sub.contains("townhome") {
        PropertyType::Townhouse
    } else if sub.contains("villa") {
        PropertyType::Villa
    } else {
        PropertyType::SingleFamily
    }
}

/// Waterfront and pool flags first, then capped slices of each feature list.
pub fn collect_features(property: &ResoProperty) -> Vec<String> {
    let mut features = Vec::new();

    if property.waterfront_yn == Some(true) {
        features.push("Waterfront".to_string());
    }
    if property.pool_private_yn == Some(true) {
        features.push("Pool".to_string());
    }

    let lists = [
        (&property.interior_features, 4),
        (&property.exterior_features, 3),
        (&property.pool_features, 2),
        (&property.view, 2),
    ];
    for (list, cap) in lists {
        if let Some(list) = list {
            features.extend(list.iter().take(cap).cloned());
        }
    }

    let mut unique: Vec<String> = Vec::with_capacity(features.len());
    for feature in features {
        if !unique.contains(&feature) {
            unique.push(feature);
        }
    }
    unique.truncate(MAX_FEATURES);
    unique
}

pub fn build_address(property: &ResoProperty) -> String {
    if let Some(address) = text(&property.unparsed_address) {
        return address.to_string();
    }

    let parts: Vec<&str> = [
        text(&property.street_number),
        text(&property.street_dir_prefix),
        text(&property.street_name),
        text(&property.street_suffix),
        text(&property.street_dir_suffix),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        "Address on Request".to_string()
    } else {
        parts.join(" ")
    }
}

/// Street portion of the address (up to the first comma).
pub fn create_title(address: &str) -> String {
    match address.split(',').next() {
        Some(street) if !street.is_empty() => street.to_string(),
        _ => "Beautiful Home".to_string(),
    }
}

fn bathrooms(property: &ResoProperty) -> f64 {
    number(property.bathrooms_total_integer).unwrap_or_else(|| {
        property.bathrooms_full.unwrap_or(0.0) + property.bathrooms_half.unwrap_or(0.0) * 0.5
    })
}

/// Map one MLS record. `photos` is stored as given (possibly empty).
pub fn transform(property: &ResoProperty, photos: Vec<String>, ctx: TransformContext) -> Listing {
    let address = build_address(property);
    let living_area =
        number(property.living_area).or_else(|| number(property.building_area_total));
    let mls_number = text(&property.listing_id)
        .unwrap_or(&property.listing_key)
        .to_string();
    let listed_date = text(&property.on_market_date)
        .or_else(|| text(&property.listing_contract_date))
        .map(str::to_string)
        .unwrap_or_else(|| ctx.today.format("%Y-%m-%d").to_string());
    let price_number = property.list_price.unwrap_or(0.0);

    Listing {
        listing_key: property.listing_key.clone(),
        listing_id: property.listing_id.clone(),
        mls_number,
        slug: generate_slug(property),
        title: create_title(&address),
        address,
        city: text(&property.city).unwrap_or(DEFAULT_CITY).to_string(),
        state: text(&property.state_or_province)
            .unwrap_or(DEFAULT_STATE)
            .to_string(),
        zip: text(&property.postal_code).unwrap_or_default().to_string(),
        price: format_price(price_number),
        price_number,
        beds: number(property.bedrooms_total).unwrap_or(0.0).floor() as i32,
        baths: bathrooms(property),
        sqft: format_sqft(living_area),
        sqft_number: living_area.unwrap_or(0.0).floor() as i32,
        property_type: map_property_type(
            property.property_type.as_deref(),
            property.property_sub_type.as_deref(),
        )
        .to_string(),
        status: map_status(property.standard_status.as_deref()).to_string(),
        year_built: number(property.year_built)
            .map(|y| y.floor() as i32)
            .unwrap_or(ctx.current_year),
        lot_size: format_lot_size(property.lot_size_acres, property.lot_size_square_feet),
        parking: format_parking(property.garage_spaces, property.parking_total),
        description: text(&property.public_remarks)
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string(),
        features: collect_features(property),
        images: photos,
        listed_date,
        agent_id: text(&property.list_agent_mls_id).map(str::to_string),
        office_name: text(&property.list_office_name).map(str::to_string),
        is_agent_listing: ctx.is_agent_listing,
        is_brokerage_listing: ctx.is_brokerage_listing,
        latitude: number(property.latitude),
        longitude: number(property.longitude),
        synced_at: ctx.synced_at,
        created_at: ctx.synced_at,
        updated_at: ctx.synced_at,
    }
}
