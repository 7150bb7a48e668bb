//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures without persistence concerns.
//!
//! # Entity Types
//!
//! - [`RedirectRule`] - A configured redirect
//! - [`RedirectCache`] - Derived `from`/`to` lookup index over enabled rules
//! - [`ExternalRedirectRecord`] - A redirect found in a third-party source
//! - [`ScanReport`] - Aggregated result of an external scan
//!
//! # Design Pattern
//!
//! Separate structs exist for each write path:
//! - `NewRule` - For inserting rules
//! - `RuleChanges` - For editing rules without touching counters
//! - `RuleInput` - Unvalidated caller input for the save operation

pub mod external;
pub mod redirect_cache;
pub mod rule;

pub use external::{ExternalRedirectRecord, ScanCacheEntry, ScanReport, SourceStatus};
pub use redirect_cache::{IncomingRef, OutgoingRef, RedirectCache};
pub use rule::{
    MatchType, NewRule, RedirectRule, RedirectStatus, RuleChanges, RuleInput, RuleTestResult,
};
