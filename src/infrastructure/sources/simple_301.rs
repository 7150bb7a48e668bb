//! Simple 301 Redirects plugin (`301_redirects` in `{prefix}options`).

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use super::php_serialized::{self, PhpValue};
use super::table_exists;
use crate::domain::entities::ExternalRedirectRecord;
use crate::domain::sources::{RedirectSource, SourceError};

const SOURCE_NAME: &str = "simple_301_redirects";
const OPTION_NAME: &str = "301_redirects";

/// Redirect map stored as a serialized `from => to` option. Always 301.
pub struct Simple301OptionSource {
    pool: Arc<PgPool>,
    table: String,
}

impl Simple301OptionSource {
    pub fn new(pool: Arc<PgPool>, table_prefix: &str) -> Self {
        Self {
            pool,
            table: format!("{}options", table_prefix),
        }
    }

    async fn option_value(&self) -> Result<Option<String>, sqlx::Error> {
        let sql = format!(
            "SELECT option_value::text FROM {} WHERE option_name = $1 LIMIT 1",
            self.table
        );

        sqlx::query_scalar::<_, Option<String>>(&sql)
            .bind(OPTION_NAME)
            .fetch_optional(self.pool.as_ref())
            .await
            .map(Option::flatten)
    }
}

#[async_trait]
impl RedirectSource for Simple301OptionSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    /// Available when the options table exists and holds the option.
    async fn is_available(&self) -> bool {
        table_exists(&self.pool, &self.table).await
            && matches!(self.option_value().await, Ok(Some(_)))
    }

    async fn scan(&self) -> Result<Vec<ExternalRedirectRecord>, SourceError> {
        let raw = self
            .option_value()
            .await
            .map_err(|e| SourceError::Read(e.to_string()))?
            .ok_or_else(|| SourceError::Unavailable(format!("option {} not set", OPTION_NAME)))?;

        parse_option(&raw)
    }
}

fn parse_option(raw: &str) -> Result<Vec<ExternalRedirectRecord>, SourceError> {
    let value = php_serialized::parse(raw).map_err(|e| SourceError::Read(e.to_string()))?;

    let entries = value
        .as_array()
        .ok_or_else(|| SourceError::Read("option is not an array".to_string()))?;

    Ok(entries
        .iter()
        .filter_map(|(from, to)| {
            let from = from.to_text()?;
            let to = to.to_text()?;
            (!from.trim().is_empty() && !to.trim().is_empty())
                .then(|| ExternalRedirectRecord::new(from, to, 301, SOURCE_NAME))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_redirect_map() {
        let raw = r#"a:3:{s:4:"/old";s:4:"/new";s:3:"/gx";s:19:"https://example.com";s:2:"/e";s:0:"";}"#;

        let records = parse_option(raw).unwrap();

        assert_eq!(
            records,
            vec![
                ExternalRedirectRecord::new("/old", "/new", 301, SOURCE_NAME),
                ExternalRedirectRecord::new("/gx", "https://example.com", 301, SOURCE_NAME),
            ]
        );
    }

    #[test]
    fn non_array_option_is_read_error() {
        assert!(matches!(
            parse_option(r#"s:3:"abc";"#),
            Err(SourceError::Read(_))
        ));
    }

    #[test]
    fn nested_values_are_skipped() {
        let raw = r#"a:1:{s:2:"/a";a:0:{}}"#;
        assert!(parse_option(raw).unwrap().is_empty());
        assert_eq!(PhpValue::Null.to_text(), None);
    }
}
