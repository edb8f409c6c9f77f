//! HTTP API for the Netloc location service.
//!
//! Exposes the library surface for integration tests.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
