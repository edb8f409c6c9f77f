//! HTTP route handlers.

pub mod auth;
pub mod device_location;
pub mod device_locations;
pub mod floorplans;
pub mod health;
pub mod locations;
