//! Translation cache behaviour through the public service.

mod common;

use std::sync::Arc;

use listings_core::domains::translation::{Lang, PropertyText, TranslationService};
use listings_core::kernel::{MemoryStore, MockTranslator};

fn service(translator: MockTranslator) -> (TranslationService, Arc<MockTranslator>, Arc<MemoryStore>) {
    let translator = Arc::new(translator);
    let store = Arc::new(MemoryStore::new());
    let service = TranslationService::new(translator.clone(), store.clone());
    (service, translator, store)
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn repeated_request_is_served_from_cache() {
    common::init_tracing();
    let (service, translator, store) = service(MockTranslator::new().translating_all());
    let input = texts(&["Ocean views", "Pool", "Ocean views"]);

    let first = service.translate_batch(&input, Lang::Es).await.unwrap();
    let second = service.translate_batch(&input, Lang::Es).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, texts(&["[es] Ocean views", "[es] Pool", "[es] Ocean views"]));
    assert_eq!(translator.call_count(), 1);
    assert_eq!(translator.calls()[0], texts(&["Ocean views", "Pool"]));
    assert_eq!(store.translation_count(), 2);
    assert_eq!(store.translation_writes(), 1);
}

#[tokio::test]
async fn english_never_touches_cache_or_translator() {
    let (service, translator, store) = service(MockTranslator::new().translating_all());
    let input = texts(&["Ocean views"]);

    let out = service.translate_batch(&input, Lang::En).await.unwrap();
    let property = service
        .translate_property(
            PropertyText {
                description: Some("Ocean views".into()),
                ..Default::default()
            },
            Lang::En,
        )
        .await
        .unwrap();

    assert_eq!(out, input);
    assert_eq!(property.description.as_deref(), Some("Ocean views"));
    assert_eq!(translator.call_count(), 0);
    assert_eq!(store.translation_reads(), 0);
    assert_eq!(store.translation_writes(), 0);
}

#[tokio::test]
async fn failed_translation_is_not_cached() {
    let (service, translator, store) = service(MockTranslator::new().failing());
    let input = texts(&["Dock"]);

    let out = service.translate_batch(&input, Lang::Es).await.unwrap();
    service.translate_batch(&input, Lang::Es).await.unwrap();

    assert_eq!(out, input);
    assert_eq!(translator.call_count(), 2);
    assert_eq!(store.translation_count(), 0);
}

#[tokio::test]
async fn property_translation_shares_the_cache() {
    let (service, translator, _store) = service(MockTranslator::new().translating_all());

    service
        .translate_batch(&texts(&["Garage"]), Lang::Es)
        .await
        .unwrap();

    let property = service
        .translate_property(
            PropertyText {
                parking: Some("Garage".into()),
                features: Some(texts(&["Garage", "Dock"])),
                ..Default::default()
            },
            Lang::Es,
        )
        .await
        .unwrap();

    assert_eq!(property.parking.as_deref(), Some("[es] Garage"));
    assert_eq!(
        property.features,
        Some(texts(&["[es] Garage", "[es] Dock"]))
    );
    assert_eq!(translator.calls()[1], texts(&["Dock"]));
}
