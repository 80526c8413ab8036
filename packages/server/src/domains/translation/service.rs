//! Read-through translation cache.
//!
//! Lookups hit the store once per batch; misses go to the translator in one
//! request and every result is written back. English is the source language,
//! so English requests never touch the store or the translator.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use super::data::{Lang, PropertyText};
use super::glossary::lookup_term;
use crate::kernel::{BaseTranslationStore, BaseTranslator};

const SOURCE_LANG: Lang = Lang::En;

#[derive(Clone)]
pub struct TranslationService {
    translator: Arc<dyn BaseTranslator>,
    store: Arc<dyn BaseTranslationStore>,
}

impl TranslationService {
    pub fn new(translator: Arc<dyn BaseTranslator>, store: Arc<dyn BaseTranslationStore>) -> Self {
        Self { translator, store }
    }

    /// Translate `texts` into `target`, same order and length.
    ///
    /// Texts with no translation (blank, or the translator gave nothing back)
    /// are returned unchanged. A translator failure is logged and treated the
    /// same way; store failures propagate.
    pub async fn translate_batch(&self, texts: &[String], target: Lang) -> Result<Vec<String>> {
        if target == SOURCE_LANG || texts.is_empty() {
            return Ok(texts.to_vec());
        }

        let mut cache = self.store.lookup(texts, SOURCE_LANG, target).await?;

        let mut seen = HashSet::new();
        let misses: Vec<String> = texts
            .iter()
            .filter(|t| !t.trim().is_empty() && !cache.contains_key(*t))
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect();

        debug!(
            total = texts.len(),
            cached = texts.len() - misses.len(),
            misses = misses.len(),
            target = %target,
            "Translation cache lookup"
        );

        if !misses.is_empty() {
            let translated = match self.translator.translate_batch(&misses, target).await {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(error = %e, count = misses.len(), "Translator failed, returning source text");
                    Vec::new()
                }
            };

            let fresh: Vec<(String, String)> = misses
                .into_iter()
                .zip(translated)
                .filter_map(|(source, result)| result.map(|t| (source, t)))
                .collect();

            self.store.store(&fresh, SOURCE_LANG, target).await?;
            cache.extend(fresh);
        }

        Ok(texts
            .iter()
            .map(|t| cache.get(t).cloned().unwrap_or_else(|| t.clone()))
            .collect())
    }

    pub async fn translate(&self, text: &str, target: Lang) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let mut out = self.translate_batch(&[text.to_string()], target).await?;
        Ok(out.pop().unwrap_or_else(|| text.to_string()))
    }

    /// Translate a listing's text fields in one batch.
    ///
    /// Type and status use the glossary when it knows the term. Absent fields
    /// stay absent.
    pub async fn translate_property(
        &self,
        property: PropertyText,
        target: Lang,
    ) -> Result<PropertyText> {
        if target == SOURCE_LANG {
            return Ok(property);
        }

        let mut result = property;
        let mut slots: Vec<Slot> = Vec::new();
        let mut texts: Vec<String> = Vec::new();

        let non_empty = |value: &Option<String>| value.clone().filter(|s| !s.is_empty());

        if let Some(description) = non_empty(&result.description) {
            slots.push(Slot::Description);
            texts.push(description);
        }
        if let Some(kind) = non_empty(&result.property_type) {
            match lookup_term(&kind, target) {
                Some(term) => result.property_type = Some(term.to_string()),
                None => {
                    slots.push(Slot::Type);
                    texts.push(kind);
                }
            }
        }
        if let Some(status) = non_empty(&result.status) {
            match lookup_term(&status, target) {
                Some(term) => result.status = Some(term.to_string()),
                None => {
                    slots.push(Slot::Status);
                    texts.push(status);
                }
            }
        }
        if let Some(parking) = non_empty(&result.parking) {
            slots.push(Slot::Parking);
            texts.push(parking);
        }
        if let Some(lot_size) = non_empty(&result.lot_size) {
            slots.push(Slot::LotSize);
            texts.push(lot_size);
        }
        for feature in result.features.iter().flatten() {
            slots.push(Slot::Feature);
            texts.push(feature.clone());
        }

        if texts.is_empty() {
            return Ok(result);
        }

        let translated = self.translate_batch(&texts, target).await?;
        let mut features = Vec::new();

        for (slot, text) in slots.into_iter().zip(translated) {
            match slot {
                Slot::Description => result.description = Some(text),
                Slot::Type => result.property_type = Some(text),
                Slot::Status => result.status = Some(text),
                Slot::Parking => result.parking = Some(text),
                Slot::LotSize => result.lot_size = Some(text),
                Slot::Feature => features.push(text),
            }
        }
        if !features.is_empty() {
            result.features = Some(features);
        }

        Ok(result)
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Description,
    Type,
    Status,
    Parking,
    LotSize,
    Feature,
}
