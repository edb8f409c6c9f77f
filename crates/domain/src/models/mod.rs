//! Domain models.

pub mod auth;
pub mod device;
pub mod device_location;
pub mod floorplan;
pub mod location;
pub mod organization;
pub mod user;

pub use auth::{AuthState, OperatorIdentity, PermAction, Permission, ResourceKind};
pub use device::{Device, DeviceResponse};
pub use device_location::{
    ContentKind, ContentRef, CreateDeviceLocationRequest, DeviceLocation, DeviceLocationPatch,
    DeviceLocationPut, DeviceLocationResponse, DeviceLocationStatus, UpdateDeviceLocationRequest,
};
pub use floorplan::{
    CreateFloorPlanRequest, FloorPlan, FloorPlanInfo, FloorPlanResponse, NestedFloorPlan,
    UpdateFloorPlanRequest,
};
pub use location::{
    CreateLocationRequest, GeoJsonLocationCollection, GeoJsonLocationFeature,
    GeoJsonLocationProperties, Location, LocationFeature, LocationFeaturePatch,
    LocationProperties, LocationPropertiesPatch, LocationResponse, LocationType, PointGeometry,
    UpdateLocationRequest,
};
pub use organization::{Organization, OrgMembership};
pub use user::{LoginRequest, LoginResponse, User};
