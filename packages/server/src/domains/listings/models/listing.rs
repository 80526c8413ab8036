use std::cmp::Ordering;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Listing - one MLS property as stored and served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub listing_key: String,
    pub listing_id: Option<String>,
    pub mls_number: String,
    pub slug: String,

    // Display
    pub title: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub price: String,
    pub price_number: f64,
    pub beds: i32,
    pub baths: f64,
    pub sqft: String,
    pub sqft_number: i32,
    pub property_type: String, // 'Single Family', 'Condo', 'Townhouse', 'Villa'
    pub status: String,        // 'For Sale', 'Pending', 'Sold'
    pub year_built: i32,
    pub lot_size: String,
    pub parking: String,
    pub description: String,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub listed_date: String, // YYYY-MM-DD

    // Source
    pub agent_id: Option<String>,
    pub office_name: Option<String>,
    pub is_agent_listing: bool,
    pub is_brokerage_listing: bool,

    // Location
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListingStatus {
    #[serde(rename = "For Sale")]
    ForSale,
    Pending,
    Sold,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::ForSale => write!(f, "For Sale"),
            ListingStatus::Pending => write!(f, "Pending"),
            ListingStatus::Sold => write!(f, "Sold"),
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "For Sale" => Ok(ListingStatus::ForSale),
            "Pending" => Ok(ListingStatus::Pending),
            "Sold" => Ok(ListingStatus::Sold),
            _ => Err(anyhow::anyhow!("Invalid listing status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    #[serde(rename = "Single Family")]
    SingleFamily,
    Condo,
    Townhouse,
    Villa,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyType::SingleFamily => write!(f, "Single Family"),
            PropertyType::Condo => write!(f, "Condo"),
            PropertyType::Townhouse => write!(f, "Townhouse"),
            PropertyType::Villa => write!(f, "Villa"),
        }
    }
}

impl std::str::FromStr for PropertyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Single Family" => Ok(PropertyType::SingleFamily),
            "Condo" => Ok(PropertyType::Condo),
            "Townhouse" => Ok(PropertyType::Townhouse),
            "Villa" => Ok(PropertyType::Villa),
            _ => Err(anyhow::anyhow!("Invalid property type: {}", s)),
        }
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Public listing query: For Sale agent or brokerage listings, agent first.
///
/// The agent/brokerage condition is an inclusive OR even though sync tags the
/// two flags exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFilter {
    /// Case-insensitive exact match
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_beds: Option<i32>,
    pub min_baths: Option<f64>,
    pub property_type: Option<String>,
    /// MLS numbers to leave out (already shown to the visitor)
    pub exclude_mls_numbers: Vec<String>,
    pub offset: i64,
    pub limit: i64,
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self {
            city: None,
            min_price: None,
            max_price: None,
            min_beds: None,
            min_baths: None,
            property_type: None,
            exclude_mls_numbers: Vec::new(),
            offset: 0,
            limit: 8,
        }
    }
}

impl ListingFilter {
    /// In-process equivalent of the SQL `WHERE` clause in [`Listing::find_for_sale`].
    pub fn matches(&self, listing: &Listing) -> bool {
        listing.status == ListingStatus::ForSale.to_string()
            && (listing.is_agent_listing || listing.is_brokerage_listing)
            && self
                .city
                .as_ref()
                .map_or(true, |c| listing.city.to_lowercase() == c.to_lowercase())
            && self.min_price.map_or(true, |p| listing.price_number >= p)
            && self.max_price.map_or(true, |p| listing.price_number <= p)
            && self.min_beds.map_or(true, |b| listing.beds >= b)
            && self.min_baths.map_or(true, |b| listing.baths >= b)
            && self
                .property_type
                .as_ref()
                .map_or(true, |t| &listing.property_type == t)
            && !self.exclude_mls_numbers.contains(&listing.mls_number)
    }
}

/// Agent listings, then brokerage listings, then newest first.
pub fn priority_order(a: &Listing, b: &Listing) -> Ordering {
    b.is_agent_listing
        .cmp(&a.is_agent_listing)
        .then(b.is_brokerage_listing.cmp(&a.is_brokerage_listing))
        .then(b.listed_date.cmp(&a.listed_date))
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Listing {
    /// Insert or replace listings keyed on `listing_key`.
    ///
    /// `created_at` of existing rows is kept; `updated_at` is bumped.
    pub async fn upsert_many(listings: &[Listing], pool: &PgPool) -> Result<u64> {
        let mut tx = pool.begin().await?;
        let mut affected = 0;

        for listing in listings {
            let result = sqlx::query(
                r#"
                INSERT INTO listings (
                    listing_key, listing_id, mls_number, slug, title, address,
                    city, state, zip, price, price_number, beds, baths, sqft,
                    sqft_number, property_type, status, year_built, lot_size,
                    parking, description, features, images, listed_date,
                    agent_id, office_name, is_agent_listing, is_brokerage_listing,
                    latitude, longitude, synced_at
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
                    $27, $28, $29, $30, $31
                )
                ON CONFLICT (listing_key) DO UPDATE SET
                    listing_id = EXCLUDED.listing_id,
                    mls_number = EXCLUDED.mls_number,
                    slug = EXCLUDED.slug,
                    title = EXCLUDED.title,
                    address = EXCLUDED.address,
                    city = EXCLUDED.city,
                    state = EXCLUDED.state,
                    zip = EXCLUDED.zip,
                    price = EXCLUDED.price,
                    price_number = EXCLUDED.price_number,
                    beds = EXCLUDED.beds,
                    baths = EXCLUDED.baths,
                    sqft = EXCLUDED.sqft,
                    sqft_number = EXCLUDED.sqft_number,
                    property_type = EXCLUDED.property_type,
                    status = EXCLUDED.status,
                    year_built = EXCLUDED.year_built,
                    lot_size = EXCLUDED.lot_size,
                    parking = EXCLUDED.parking,
                    description = EXCLUDED.description,
                    features = EXCLUDED.features,
                    images = EXCLUDED.images,
                    listed_date = EXCLUDED.listed_date,
                    agent_id = EXCLUDED.agent_id,
                    office_name = EXCLUDED.office_name,
                    is_agent_listing = EXCLUDED.is_agent_listing,
                    is_brokerage_listing = EXCLUDED.is_brokerage_listing,
                    latitude = EXCLUDED.latitude,
                    longitude = EXCLUDED.longitude,
                    synced_at = EXCLUDED.synced_at,
                    updated_at = NOW()
                "#,
            )
            .bind(&listing.listing_key)
            .bind(&listing.listing_id)
            .bind(&listing.mls_number)
            .bind(&listing.slug)
            .bind(&listing.title)
            .bind(&listing.address)
            .bind(&listing.city)
            .bind(&listing.state)
            .bind(&listing.zip)
            .bind(&listing.price)
            .bind(listing.price_number)
            .bind(listing.beds)
            .bind(listing.baths)
            .bind(&listing.sqft)
            .bind(listing.sqft_number)
            .bind(&listing.property_type)
            .bind(&listing.status)
            .bind(listing.year_built)
            .bind(&listing.lot_size)
            .bind(&listing.parking)
            .bind(&listing.description)
            .bind(&listing.features)
            .bind(&listing.images)
            .bind(&listing.listed_date)
            .bind(&listing.agent_id)
            .bind(&listing.office_name)
            .bind(listing.is_agent_listing)
            .bind(listing.is_brokerage_listing)
            .bind(listing.latitude)
            .bind(listing.longitude)
            .bind(listing.synced_at)
            .execute(&mut *tx)
            .await?;

            affected += result.rows_affected();
        }

        tx.commit().await?;
        Ok(affected)
    }

    /// Public listing page. Pass `limit + 1` to detect whether more rows exist.
    pub async fn find_for_sale(filter: &ListingFilter, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Listing>(
            r#"
            SELECT * FROM listings
            WHERE status = 'For Sale'
              AND (is_agent_listing OR is_brokerage_listing)
              AND ($1::text IS NULL OR LOWER(city) = LOWER($1))
              AND ($2::float8 IS NULL OR price_number >= $2)
              AND ($3::float8 IS NULL OR price_number <= $3)
              AND ($4::int4 IS NULL OR beds >= $4)
              AND ($5::float8 IS NULL OR baths >= $5)
              AND ($6::text IS NULL OR property_type = $6)
              AND NOT (mls_number = ANY($7::text[]))
            ORDER BY is_agent_listing DESC, is_brokerage_listing DESC, listed_date DESC
            LIMIT $8 OFFSET $9
            "#,
        )
        .bind(&filter.city)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.min_beds)
        .bind(filter.min_baths)
        .bind(&filter.property_type)
        .bind(&filter.exclude_mls_numbers)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Find by slug or MLS number, preferring agent listings on a slug clash
    pub async fn find_by_slug_or_mls_number(
        identifier: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Listing>(
            r#"
            SELECT * FROM listings
            WHERE slug = $1 OR mls_number = $1
            ORDER BY is_agent_listing DESC, updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Case-insensitive substring search over city, address and title
    pub async fn search(text: &str, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Listing>(
            r#"
            SELECT * FROM listings
            WHERE status = 'For Sale'
              AND (city ILIKE $1 OR address ILIKE $1 OR title ILIKE $1)
            ORDER BY price_number DESC
            LIMIT $2
            "#,
        )
        .bind(like_pattern(text))
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// All listings belonging to the site's agent, newest first
    pub async fn find_agent_listings(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Listing>(
            "SELECT * FROM listings WHERE is_agent_listing ORDER BY listed_date DESC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Highest-priced For Sale agent listing
    pub async fn find_featured(pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Listing>(
            r#"
            SELECT * FROM listings
            WHERE is_agent_listing AND status = 'For Sale'
            ORDER BY price_number DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM listings")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
