pub mod data;
pub mod format;
pub mod models;
pub mod transform;

pub use data::ListingView;
pub use models::listing::{Listing, ListingFilter, ListingStatus, PropertyType};
pub use transform::{transform, TransformContext, NO_IMAGE_PLACEHOLDER};
