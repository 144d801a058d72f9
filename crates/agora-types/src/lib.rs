//! Shared data model and wire types for Agora.
//!
//! `models` holds the records persisted by the stores, `api` holds request
//! and response bodies plus the bearer token claims.

pub mod api;
pub mod models;
