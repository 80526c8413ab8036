// HTTP middleware
pub mod sync_auth;

pub use sync_auth::*;
