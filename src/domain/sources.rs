//! Contract for read-only external redirect sources.

use async_trait::async_trait;

use crate::domain::entities::ExternalRedirectRecord;

/// Errors a source may report while scanning.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The backing table or file does not exist.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read source: {0}")]
    Read(String),
}

/// A third-party place redirects may be defined in.
///
/// Sources only ever read. A missing table or file is reported through
/// [`RedirectSource::is_available`] and never as a scan failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedirectSource: Send + Sync {
    /// Stable name used as the key of `sources_checked` and in records.
    fn name(&self) -> &'static str;

    async fn is_available(&self) -> bool;

    /// Reads every redirect the source defines.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the source exists but cannot be read.
    async fn scan(&self) -> Result<Vec<ExternalRedirectRecord>, SourceError>;
}
