//! DTOs for external scan endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{ScanCacheEntry, ScanReport};

/// Response for `GET /api/scan`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CachedScanResponse {
    pub last_scanned: Option<DateTime<Utc>>,
    pub report: Option<ScanReport>,
}

/// Response for `GET /api/scan/annotation`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnnotationResponse {
    pub path: String,
    pub annotation: Option<ScanCacheEntry>,
}
