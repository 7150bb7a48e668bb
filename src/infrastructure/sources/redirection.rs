//! Redirection plugin (`{prefix}redirection_items`).

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use super::table_exists;
use crate::domain::entities::ExternalRedirectRecord;
use crate::domain::sources::{RedirectSource, SourceError};

const SOURCE_NAME: &str = "redirection";

#[derive(Debug, FromRow)]
struct ItemRow {
    url: String,
    action_data: Option<String>,
    action_code: Option<i32>,
    last_count: Option<i64>,
}

impl From<ItemRow> for ExternalRedirectRecord {
    fn from(row: ItemRow) -> Self {
        let status = row
            .action_code
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(301);

        let record = ExternalRedirectRecord::new(
            row.url,
            row.action_data.unwrap_or_default(),
            status,
            SOURCE_NAME,
        );

        match row.last_count {
            Some(hits) => record.with_hits(hits),
            None => record,
        }
    }
}

/// Enabled items of the Redirection plugin.
pub struct RedirectionTableSource {
    pool: Arc<PgPool>,
    table: String,
}

impl RedirectionTableSource {
    pub fn new(pool: Arc<PgPool>, table_prefix: &str) -> Self {
        Self {
            pool,
            table: format!("{}redirection_items", table_prefix),
        }
    }
}

#[async_trait]
impl RedirectSource for RedirectionTableSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn is_available(&self) -> bool {
        table_exists(&self.pool, &self.table).await
    }

    async fn scan(&self) -> Result<Vec<ExternalRedirectRecord>, SourceError> {
        let sql = format!(
            r#"
            SELECT url::text AS url,
                   action_data::text AS action_data,
                   action_code::int4 AS action_code,
                   last_count::int8 AS last_count
            FROM {}
            WHERE status = 'enabled'
            ORDER BY position ASC, id ASC
            "#,
            self.table
        );

        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(|e| SourceError::Read(e.to_string()))?;

        Ok(rows.into_iter().map(ExternalRedirectRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_maps_to_record() {
        let record = ExternalRedirectRecord::from(ItemRow {
            url: "/old".to_string(),
            action_data: Some("/new".to_string()),
            action_code: Some(302),
            last_count: Some(9),
        });

        assert_eq!(record.from, "/old");
        assert_eq!(record.to, "/new");
        assert_eq!(record.status, 302);
        assert_eq!(record.hits, Some(9));
        assert_eq!(record.source, "redirection");
    }

    #[test]
    fn missing_code_defaults_to_301() {
        let record = ExternalRedirectRecord::from(ItemRow {
            url: "/old".to_string(),
            action_data: None,
            action_code: None,
            last_count: None,
        });

        assert_eq!(record.status, 301);
        assert_eq!(record.hits, None);
    }
}
