use serde::{Deserialize, Serialize};

use super::models::listing::Listing;
use super::transform::NO_IMAGE_PLACEHOLDER;

/// API representation of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    /// The MLS listing key
    pub id: String,
    pub slug: String,
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
    #[serde(rename = "type")]
    pub property_type: String,
    pub status: String,
    pub year_built: i32,
    pub lot_size: String,
    pub parking: String,
    pub description: String,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub mls_number: String,
    pub listed_date: String,

    // Source
    pub is_agent_listing: bool,
    pub is_brokerage_listing: bool,
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

impl From<Listing> for ListingView {
    fn from(listing: Listing) -> Self {
        let images = if listing.images.is_empty() {
            vec![NO_IMAGE_PLACEHOLDER.to_string()]
        } else {
            listing.images
        };

        Self {
            id: listing.listing_key,
            slug: listing.slug,
            title: listing.title,
            address: listing.address,
            city: listing.city,
            state: listing.state,
            zip: listing.zip,
            price: listing.price,
            price_number: listing.price_number,
            beds: listing.beds,
            baths: listing.baths,
            sqft: or_default(listing.sqft, "N/A"),
            sqft_number: listing.sqft_number,
            property_type: listing.property_type,
            status: listing.status,
            year_built: listing.year_built,
            lot_size: or_default(listing.lot_size, "N/A"),
            parking: or_default(listing.parking, "Parking available"),
            description: listing.description,
            features: listing.features,
            images,
            mls_number: listing.mls_number,
            listed_date: listing.listed_date,
            is_agent_listing: listing.is_agent_listing,
            is_brokerage_listing: listing.is_brokerage_listing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::listings::transform::{transform, TransformContext};
    use reso_client::ResoProperty;

    #[test]
    fn empty_images_become_placeholder() {
        let listing = transform(
            &ResoProperty {
                listing_key: "K1".into(),
                ..Default::default()
            },
            vec![],
            TransformContext::now(),
        );
        let view = ListingView::from(listing);
        assert_eq!(view.images, vec![NO_IMAGE_PLACEHOLDER.to_string()]);
        assert_eq!(view.id, "K1");
    }

    #[test]
    fn serializes_camel_case_with_type_field() {
        let mut listing = transform(
            &ResoProperty {
                listing_key: "K2".into(),
                property_sub_type: Some("Condominium".into()),
                ..Default::default()
            },
            vec!["1.jpg".into()],
            TransformContext::now().with_flags(false, true),
        );
        listing.parking = String::new();

        let json = serde_json::to_value(ListingView::from(listing)).unwrap();
        assert_eq!(json["type"], "Condo");
        assert_eq!(json["mlsNumber"], "K2");
        assert_eq!(json["isBrokerageListing"], true);
        assert_eq!(json["parking"], "Parking available");
        assert_eq!(json["images"][0], "1.jpg");
    }
}
