//! Utility functions for path processing, identifiers and request handling.
//!
//! This module provides helper functions used across the application:
//!
//! - [`path_normalizer`] - Path normalization and rule-path formatting
//! - [`import_parser`] - Delimited bulk-import parsing
//! - [`rule_id`] - Rule identifier generation

pub mod import_parser;
pub mod path_normalizer;
pub mod rule_id;
