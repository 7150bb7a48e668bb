//! Rank Math redirections (`{prefix}rank_math_redirections`).

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tracing::warn;

use super::php_serialized::{self, PhpValue};
use super::table_exists;
use crate::domain::entities::ExternalRedirectRecord;
use crate::domain::sources::{RedirectSource, SourceError};

const SOURCE_NAME: &str = "rank_math";

#[derive(Debug, FromRow)]
struct RedirectionRow {
    id: i64,
    sources: String,
    url_to: String,
    header_code: Option<i32>,
    hits: Option<i64>,
}

/// Active Rank Math redirections, one record per source pattern.
pub struct RankMathTableSource {
    pool: Arc<PgPool>,
    table: String,
}

impl RankMathTableSource {
    pub fn new(pool: Arc<PgPool>, table_prefix: &str) -> Self {
        Self {
            pool,
            table: format!("{}rank_math_redirections", table_prefix),
        }
    }
}

#[async_trait]
impl RedirectSource for RankMathTableSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn is_available(&self) -> bool {
        table_exists(&self.pool, &self.table).await
    }

    async fn scan(&self) -> Result<Vec<ExternalRedirectRecord>, SourceError> {
        let sql = format!(
            r#"
            SELECT id::int8 AS id,
                   sources::text AS sources,
                   url_to::text AS url_to,
                   header_code::int4 AS header_code,
                   hits::int8 AS hits
            FROM {}
            WHERE status = 'active'
            ORDER BY id ASC
            "#,
            self.table
        );

        let rows = sqlx::query_as::<_, RedirectionRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(|e| SourceError::Read(e.to_string()))?;

        Ok(rows.into_iter().flat_map(records_for).collect())
    }
}

fn records_for(row: RedirectionRow) -> Vec<ExternalRedirectRecord> {
    let patterns = match source_patterns(&row.sources) {
        Ok(patterns) => patterns,
        Err(e) => {
            warn!(id = row.id, error = %e, "Skipping Rank Math row with unreadable sources");
            return Vec::new();
        }
    };

    let status = row
        .header_code
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(301);

    patterns
        .into_iter()
        .map(|pattern| {
            let record = ExternalRedirectRecord::new(pattern, &row.url_to, status, SOURCE_NAME);
            match row.hits {
                Some(hits) => record.with_hits(hits),
                None => record,
            }
        })
        .collect()
}

/// Extracts the `pattern` of every entry in a serialized `sources` list.
fn source_patterns(raw: &str) -> Result<Vec<String>, php_serialized::PhpParseError> {
    let value = php_serialized::parse(raw)?;

    Ok(value
        .as_array()
        .unwrap_or_default()
        .iter()
        .filter_map(|(_, entry)| entry.get("pattern").and_then(PhpValue::to_text))
        .filter(|p| !p.trim().is_empty())
        .collect())
}
