//! Domain layer for the Netloc backend.
//!
//! This crate contains:
//! - Domain models (Organization, Device, Location, FloorPlan, DeviceLocation)
//! - Wire payload types (GeoJSON feature bodies)
//! - Pure business services: organization scoping, the dual authorization
//!   pipeline, and the location-type/floor-plan consistency rules

pub mod models;
pub mod services;
