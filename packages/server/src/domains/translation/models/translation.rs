use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Translation - cached machine translation of one text
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Translation {
    pub id: i64,
    pub source_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub translated_text: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Translation {
    /// Cached translations for any of `texts`
    pub async fn find_many(
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Translation>(
            r#"
            SELECT * FROM translations
            WHERE source_lang = $1 AND target_lang = $2 AND source_text = ANY($3)
            "#,
        )
        .bind(source_lang)
        .bind(target_lang)
        .bind(texts)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert or overwrite `(source_text, translated_text)` pairs
    pub async fn upsert_many(
        entries: &[(String, String)],
        source_lang: &str,
        target_lang: &str,
        pool: &PgPool,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let (sources, translated): (Vec<String>, Vec<String>) = entries.iter().cloned().unzip();

        sqlx::query(
            r#"
            INSERT INTO translations (source_text, source_lang, target_lang, translated_text)
            SELECT source_text, $1, $2, translated_text
            FROM UNNEST($3::text[], $4::text[]) AS t(source_text, translated_text)
            ON CONFLICT (source_text, source_lang, target_lang)
            DO UPDATE SET translated_text = EXCLUDED.translated_text
            "#,
        )
        .bind(source_lang)
        .bind(target_lang)
        .bind(&sources)
        .bind(&translated)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM translations")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
