// Palm Beach Listings - API Core
//
// Mirrors MLS listing data into a local store for fast serving, and translates
// listing text on demand through a read-through cache.
//
// Domains live under domains/; infrastructure traits, adapters and stores
// under kernel/; the HTTP surface under server/.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
