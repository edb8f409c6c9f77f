//! Entity definitions (database row mappings).

pub mod device;
pub mod device_location;
pub mod floorplan;
pub mod location;
pub mod organization;
pub mod user;

pub use device::DeviceEntity;
pub use device_location::DeviceLocationEntity;
pub use floorplan::FloorPlanEntity;
pub use location::{LocationEntity, LocationWithDeviceCountEntity};
pub use organization::{OrgMembershipEntity, OrganizationEntity};
pub use user::{PermissionEntity, UserEntity};
