//! Rule store implementations.
//!
//! # Repositories
//!
//! - [`PgRuleRepository`] - PostgreSQL-backed rule store
//! - [`MemoryRuleRepository`] - In-process rule store for tests and tooling

pub mod memory_rule_repository;
pub mod pg_rule_repository;

pub use memory_rule_repository::MemoryRuleRepository;
pub use pg_rule_repository::PgRuleRepository;
