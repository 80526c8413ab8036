//! Machine translation adapters.

use anyhow::Result;
use async_trait::async_trait;
use deepl_client::DeepLClient;

use super::BaseTranslator;
use crate::domains::translation::Lang;

/// Wrapper around DeepLClient that implements BaseTranslator trait
pub struct DeepLTranslator(pub DeepLClient);

impl DeepLTranslator {
    pub fn new(client: DeepLClient) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseTranslator for DeepLTranslator {
    async fn translate_batch(&self, texts: &[String], target: Lang) -> Result<Vec<Option<String>>> {
        self.0
            .translate_batch(texts, target.into())
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

/// Stands in when no translation key is configured. Never translates.
pub struct NoopTranslator;

#[async_trait]
impl BaseTranslator for NoopTranslator {
    async fn translate_batch(&self, texts: &[String], _target: Lang) -> Result<Vec<Option<String>>> {
        tracing::debug!(count = texts.len(), "Translation not configured, passing text through");
        Ok(vec![None; texts.len()])
    }
}
