//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod mls;
pub mod scheduled_tasks;
pub mod stores;
pub mod test_dependencies;
pub mod traits;
pub mod translator;

pub use deps::ServerDeps;
pub use mls::{NoopMlsSource, ResoMlsSource};
pub use stores::{MemoryStore, PostgresStore};
pub use test_dependencies::{MockMlsSource, MockTranslator};
pub use traits::*;
pub use translator::{DeepLTranslator, NoopTranslator};
