//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for persistence, caching and external sources.
//!
//! # Modules
//!
//! - [`cache`] - Cache backends (Redis and in-memory)
//! - [`persistence`] - Rule store implementations
//! - [`sources`] - External redirect sources for the scanner

pub mod cache;
pub mod persistence;
pub mod sources;
