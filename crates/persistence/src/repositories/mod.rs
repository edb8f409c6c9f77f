//! Repository layer for database access.

pub mod device;
pub mod device_location;
pub mod floorplan;
pub mod location;
pub mod organization;
pub mod user;

pub use device::DeviceRepository;
pub use device_location::{DeviceLocationRepository, DeviceLocationUpdate};
pub use floorplan::FloorPlanRepository;
pub use location::{LocationRepository, LocationUpdate, NewFloorPlan};
pub use organization::OrganizationRepository;
pub use user::UserRepository;
