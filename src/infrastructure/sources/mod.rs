//! Read-only adapters for redirects defined by third-party tools.
//!
//! # Sources
//!
//! - [`HtaccessSource`] - Apache `.htaccess` directives
//! - [`RedirectionTableSource`] - Redirection plugin table
//! - [`RankMathTableSource`] - Rank Math redirections table
//! - [`Simple301OptionSource`] - Simple 301 Redirects option
//!
//! Table-backed sources read from the same PostgreSQL database as the rule
//! store, using a configurable table prefix (`wp_` by default).

mod htaccess;
pub mod php_serialized;
mod rank_math;
mod redirection;
mod simple_301;

pub use htaccess::{HtaccessSource, parse_htaccess};
pub use rank_math::RankMathTableSource;
pub use redirection::RedirectionTableSource;
pub use simple_301::Simple301OptionSource;

use sqlx::PgPool;
use tracing::warn;

/// True if a table with this name exists in the current schema search path.
pub(crate) async fn table_exists(pool: &PgPool, table: &str) -> bool {
    let exists = sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
        .bind(table)
        .fetch_one(pool)
        .await;

    match exists {
        Ok(exists) => exists,
        Err(e) => {
            warn!(table, error = %e, "Failed to probe table");
            false
        }
    }
}

/// Table prefixes are interpolated into SQL, so only identifier characters
/// are accepted.
pub fn is_valid_table_prefix(prefix: &str) -> bool {
    prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
