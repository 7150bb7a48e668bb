//! Request and response bodies for the admin API.
//!
//! Inputs are checked with `validator` before they reach a service.

pub mod health;
pub mod rules;
pub mod scan;
pub mod tester;
