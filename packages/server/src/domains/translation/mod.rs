//! Read-through translation cache for listing text.

pub mod data;
pub mod glossary;
pub mod models;
pub mod service;

pub use data::{Lang, PropertyText};
pub use glossary::translate_term;
pub use models::translation::Translation;
pub use service::TranslationService;
