//! Persistence layer for the Netloc backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional cascades
//!   required by the location-type consistency rules

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
