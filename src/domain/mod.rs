//! Domain layer containing business entities and logic.
//!
//! Independent of HTTP, SQL and cache details. Infrastructure implements the
//! traits defined here.
//!
//! # Architecture
//!
//! - [`entities`] - Rules, the redirect index and external scan records
//! - [`repositories`] - Rule store trait
//! - [`matcher`] - Pattern compilation, matching and target building
//! - [`sources`] - External redirect source trait
//! - [`hit_event`] - Dispatch hit event
//!
//! # Hit Processing Flow
//!
//! 1. The dispatch middleware matches a rule
//! 2. A [`hit_event::HitEvent`] is sent to a bounded channel
//! 3. [`crate::application::hit_worker::run_hit_worker`] increments the counter with retry
//! 4. The redirect index is invalidated and rebuilt on next read

pub mod entities;
pub mod hit_event;
pub mod matcher;
pub mod repositories;
pub mod sources;
