use serde::{Deserialize, Serialize};

/// Fields requested through `$select` on every `Property` query.
pub const PROPERTY_SELECT: &[&str] = &[
    "ListingKey",
    "ListingId",
    "StandardStatus",
    "MlsStatus",
    "PropertyType",
    "PropertySubType",
    "UnparsedAddress",
    "StreetNumber",
    "StreetName",
    "StreetSuffix",
    "StreetDirPrefix",
    "StreetDirSuffix",
    "City",
    "StateOrProvince",
    "PostalCode",
    "CountyOrParish",
    "Latitude",
    "Longitude",
    "ListPrice",
    "BedroomsTotal",
    "BathroomsTotalInteger",
    "BathroomsFull",
    "BathroomsHalf",
    "LivingArea",
    "BuildingAreaTotal",
    "LotSizeAcres",
    "LotSizeSquareFeet",
    "YearBuilt",
    "GarageSpaces",
    "ParkingTotal",
    "PublicRemarks",
    "ListAgentFullName",
    "ListAgentMlsId",
    "ListOfficeName",
    "ListingContractDate",
    "OnMarketDate",
    "DaysOnMarket",
    "InteriorFeatures",
    "ExteriorFeatures",
    "PoolFeatures",
    "WaterfrontFeatures",
    "WaterfrontYN",
    "PoolPrivateYN",
    "View",
    "PhotosCount",
];

/// OData collection envelope returned by the RESO Web API.
#[derive(Debug, Clone, Deserialize)]
pub struct ODataResponse<T> {
    #[serde(rename = "@odata.context", default)]
    pub context: Option<String>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// A `Property` record as served by the MLS.
///
/// Only `ListingKey` is guaranteed; every other field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ResoProperty {
    pub listing_key: String,
    pub listing_id: Option<String>,
    pub standard_status: Option<String>,
    pub mls_status: Option<String>,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,
    pub unparsed_address: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub street_suffix: Option<String>,
    pub street_dir_prefix: Option<String>,
    pub street_dir_suffix: Option<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_code: Option<String>,
    pub county_or_parish: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub list_price: Option<f64>,
    pub bedrooms_total: Option<f64>,
    pub bathrooms_total_integer: Option<f64>,
    pub bathrooms_full: Option<f64>,
    pub bathrooms_half: Option<f64>,
    pub living_area: Option<f64>,
    pub building_area_total: Option<f64>,
    pub lot_size_acres: Option<f64>,
    pub lot_size_square_feet: Option<f64>,
    pub year_built: Option<f64>,
    pub garage_spaces: Option<f64>,
    pub parking_total: Option<f64>,
    pub public_remarks: Option<String>,
    pub list_agent_full_name: Option<String>,
    pub list_agent_mls_id: Option<String>,
    pub list_office_name: Option<String>,
    pub listing_contract_date: Option<String>,
    pub on_market_date: Option<String>,
    pub days_on_market: Option<i64>,
    pub interior_features: Option<Vec<String>>,
    pub exterior_features: Option<Vec<String>>,
    pub pool_features: Option<Vec<String>>,
    pub waterfront_features: Option<Vec<String>>,
    #[serde(rename = "WaterfrontYN")]
    pub waterfront_yn: Option<bool>,
    #[serde(rename = "PoolPrivateYN")]
    pub pool_private_yn: Option<bool>,
    pub view: Option<Vec<String>>,
    pub photos_count: Option<i64>,
}

impl ResoProperty {
    /// Case-insensitive substring match on the listing office name.
    ///
    /// `needle_lower` must already be lowercased.
    pub fn office_matches(&self, needle_lower: &str) -> bool {
        self.list_office_name
            .as_deref()
            .map(|name| name.to_lowercase().contains(needle_lower))
            .unwrap_or(false)
    }
}

/// A `Media` record attached to a property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MediaItem {
    #[serde(rename = "MediaURL")]
    pub media_url: Option<String>,
    pub mime_type: Option<String>,
    pub media_category: Option<String>,
    pub order: Option<i64>,
}

impl MediaItem {
    /// Whether this media entry is an actual photo (not a PDF or document).
    pub fn is_photo(&self) -> bool {
        let Some(url) = self.media_url.as_deref().filter(|u| !u.is_empty()) else {
            return false;
        };
        let url = url.to_lowercase();
        let mime = self.mime_type.as_deref().unwrap_or("").to_lowercase();

        if url.ends_with(".pdf") || mime.contains("pdf") {
            return false;
        }
        !url.contains("/documents/")
    }
}

/// Search parameters for `Property` queries. All filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingSearchParams {
    /// `StandardStatus` value; `Active` when unset
    pub status: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Minimum bedrooms
    pub beds: Option<u32>,
    /// Minimum full bathrooms
    pub baths: Option<u32>,
    pub property_type: Option<String>,
    /// `ListAgentKey` value
    pub agent_key: Option<String>,
    /// `$top`; 20 when unset
    pub limit: Option<u32>,
    /// `$skip`
    pub offset: Option<u32>,
    /// `$orderby`; `OnMarketDate desc` when unset
    pub sort: Option<String>,
}

/// One page of `Property` results.
///
/// A throttled request yields an empty page with `rate_limited` set, so callers
/// can tell "no rows" apart from "the MLS refused to answer".
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub listings: Vec<ResoProperty>,
    pub next_link: Option<String>,
    pub rate_limited: bool,
}

impl ListingPage {
    pub fn rate_limited() -> Self {
        Self {
            rate_limited: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl From<ODataResponse<ResoProperty>> for ListingPage {
    fn from(resp: ODataResponse<ResoProperty>) -> Self {
        Self {
            listings: resp.value,
            next_link: resp.next_link,
            rate_limited: false,
        }
    }
}

/// Outcome of a photo fetch for one listing.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoFetch {
    /// Photos in source order (possibly none)
    Photos(Vec<MediaItem>),
    /// The MLS kept answering 429 after all retries; never cache this
    RateLimited,
}

impl PhotoFetch {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PhotoFetch::RateLimited)
    }

    /// Photo URLs, capped at `max`. Empty for a rate-limited fetch.
    pub fn urls(&self, max: usize) -> Vec<String> {
        match self {
            PhotoFetch::Photos(items) => items
                .iter()
                .filter_map(|m| m.media_url.clone())
                .filter(|u| !u.is_empty())
                .take(max)
                .collect(),
            PhotoFetch::RateLimited => Vec::new(),
        }
    }
}

/// Result of a brokerage-wide office scan.
#[derive(Debug, Clone, Default)]
pub struct OfficeScan {
    pub listings: Vec<ResoProperty>,
    /// Number of MLS rows inspected
    pub scanned: usize,
    /// False when the scan stopped early (deadline or persistent rate limiting)
    pub complete: bool,
}
