//! Shared utilities and common types for the Netloc backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Device key generation and constant-time comparison
//! - Password hashing with Argon2id
//! - JWT bearer token utilities
//! - Pagination helpers
//! - Coordinate validation

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
