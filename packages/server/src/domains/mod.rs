pub mod listings;
pub mod sync;
pub mod translation;
