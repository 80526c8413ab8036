// HTTP routes
pub mod health;
pub mod listings;
pub mod sync;
pub mod translate;

pub use health::*;
pub use listings::*;
pub use sync::*;
pub use translate::*;
