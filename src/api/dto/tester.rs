//! DTOs for live tester endpoints.

use serde::Deserialize;
use validator::Validate;

/// Request body for `POST /api/test`.
#[derive(Debug, Deserialize, Validate)]
pub struct TestRequest {
    #[validate(length(min = 1, max = 2048, message = "Path must be 1-2048 characters"))]
    pub path: String,
}

/// Request body for `POST /api/test/chain`.
#[derive(Debug, Deserialize, Validate)]
pub struct ChainRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,
}
