//! Test fixtures: MLS records and in-memory dependency wiring.

use std::sync::Arc;
use std::time::Duration;

use listings_core::domains::sync::SyncOptions;
use listings_core::kernel::{MemoryStore, MockMlsSource, MockTranslator, ServerDeps};
use reso_client::ResoProperty;

pub const AGENT_KEY: &str = "AGENT-1";
pub const OFFICE: &str = "Partnership";

/// An active MLS record with enough fields to produce a complete listing
pub fn property(key: &str, mls_number: &str, city: &str, price: f64) -> ResoProperty {
    ResoProperty {
        listing_key: key.to_string(),
        listing_id: Some(mls_number.to_string()),
        standard_status: Some("Active".to_string()),
        property_type: Some("Residential".to_string()),
        property_sub_type: Some("Single Family Residence".to_string()),
        street_number: Some("100".to_string()),
        street_name: Some("Ocean".to_string()),
        street_suffix: Some("Blvd".to_string()),
        city: Some(city.to_string()),
        state_or_province: Some("FL".to_string()),
        postal_code: Some("33480".to_string()),
        list_price: Some(price),
        bedrooms_total: Some(3.0),
        bathrooms_total_integer: Some(2.0),
        living_area: Some(2_000.0),
        year_built: Some(2001.0),
        public_remarks: Some("Bright and open.".to_string()),
        list_office_name: Some("Partnership Realty".to_string()),
        on_market_date: Some("2025-01-10".to_string()),
        ..Default::default()
    }
}

pub fn property_listed(key: &str, mls_number: &str, listed: &str) -> ResoProperty {
    ResoProperty {
        on_market_date: Some(listed.to_string()),
        ..property(key, mls_number, "Jupiter", 500_000.0)
    }
}

/// Sync pacing with millisecond delays
pub fn fast_sync_options() -> SyncOptions {
    SyncOptions {
        batch_size: 2,
        batch_delay: Duration::from_millis(1),
        photo_attempts: 3,
        rate_limit_base: Duration::from_millis(2),
        error_delay: Duration::from_millis(1),
        max_photos: 6,
    }
}

/// In-memory dependencies for the agent `AGENT_KEY` and brokerage `OFFICE`
pub fn memory_deps(
    mls: Arc<MockMlsSource>,
    translator: Arc<MockTranslator>,
) -> (Arc<ServerDeps>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let deps = ServerDeps::in_memory(mls, translator, store.clone())
        .with_agent_key(Some(AGENT_KEY.to_string()))
        .with_brokerage_name(OFFICE);
    (Arc::new(deps), store)
}
