//! Device-location association model and wire payloads.
//!
//! The association binds one device to one location, optionally one floor
//! plan, plus a free-text indoor pixel coordinate. The owner side is a
//! tagged reference (`ContentRef`) so that other owner kinds can be
//! registered without changing the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::floorplan::{FloorPlanInfo, NestedFloorPlan};
use crate::models::location::{LocationFeature, LocationFeaturePatch};

/// Kinds of objects that can own a location association.
///
/// Acts as the registry of resolvable owner types; resolution happens in
/// the persistence layer keyed on the database string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Device,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Device => "device",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "device" => Some(ContentKind::Device),
            _ => None,
        }
    }
}

/// Tagged reference to the owning object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: Uuid,
}

impl ContentRef {
    pub fn device(id: Uuid) -> Self {
        Self {
            kind: ContentKind::Device,
            id,
        }
    }
}

/// The association record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceLocation {
    pub id: Uuid,
    pub content_object: ContentRef,
    pub location: Uuid,
    pub floorplan: Option<Uuid>,
    /// Pixel/offset coordinate on the floor plan. `""` means an indoor
    /// association with nothing recorded yet; `None` means not applicable.
    pub indoor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Deserializes a field that must distinguish "absent" from "explicit
/// null": absent stays `None`, `null` becomes `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// PATCH body for the single-device endpoint. All members optional;
/// `floorplan` and `indoor` support explicit null to detach/clear.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DeviceLocationPatch {
    #[validate(nested)]
    pub location: Option<LocationFeaturePatch>,
    #[serde(default, deserialize_with = "double_option")]
    pub floorplan: Option<Option<NestedFloorPlan>>,
    #[serde(default, deserialize_with = "double_option")]
    pub indoor: Option<Option<String>>,
}

/// PUT body for the single-device endpoint: full replace, requires a
/// complete nested location Feature.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeviceLocationPut {
    #[validate(nested)]
    pub location: LocationFeature,
    pub floorplan: Option<NestedFloorPlan>,
    pub indoor: Option<String>,
}

/// Response body for the single-device endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceLocationStatus {
    pub location: LocationFeature,
    pub floorplan: Option<FloorPlanInfo>,
    pub indoor: Option<String>,
}

/// Request payload for creating a raw association via the operator
/// collection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeviceLocationRequest {
    pub content_type: ContentKind,
    pub content_id: Uuid,
    pub location: Uuid,
    pub floorplan: Option<Uuid>,
    pub indoor: Option<String>,
}

/// Request payload for updating a raw association (partial). `floorplan`
/// and `indoor` support explicit null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDeviceLocationRequest {
    pub location: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub floorplan: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub indoor: Option<Option<String>>,
}

/// Response payload for the raw association endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceLocationResponse {
    pub id: Uuid,
    pub content_type: ContentKind,
    pub content_id: Uuid,
    pub location: Uuid,
    pub floorplan: Option<Uuid>,
    pub indoor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeviceLocation> for DeviceLocationResponse {
    fn from(dl: DeviceLocation) -> Self {
        Self {
            id: dl.id,
            content_type: dl.content_object.kind,
            content_id: dl.content_object.id,
            location: dl.location,
            floorplan: dl.floorplan,
            indoor: dl.indoor,
            created_at: dl.created_at,
            updated_at: dl.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::LocationType;

    #[test]
    fn test_content_kind_roundtrip() {
        assert_eq!(ContentKind::parse("device"), Some(ContentKind::Device));
        assert_eq!(ContentKind::parse("antenna"), None);
        assert_eq!(ContentKind::Device.as_str(), "device");
    }

    #[test]
    fn test_patch_absent_vs_null_floorplan() {
        let patch: DeviceLocationPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.floorplan.is_none());
        assert!(patch.indoor.is_none());

        let patch: DeviceLocationPatch = serde_json::from_str(r#"{"floorplan": null}"#).unwrap();
        assert_eq!(patch.floorplan.as_ref().map(|f| f.is_none()), Some(true));

        let patch: DeviceLocationPatch =
            serde_json::from_str(r#"{"floorplan": {"floor": 1, "image": "a.png"}}"#).unwrap();
        let nested = patch.floorplan.unwrap().unwrap();
        assert_eq!(nested.floor, Some(1));
    }

    #[test]
    fn test_patch_indoor_explicit_null() {
        let patch: DeviceLocationPatch = serde_json::from_str(r#"{"indoor": null}"#).unwrap();
        assert_eq!(patch.indoor, Some(None));

        let patch: DeviceLocationPatch =
            serde_json::from_str(r#"{"indoor": "120.3,45.9"}"#).unwrap();
        assert_eq!(patch.indoor, Some(Some("120.3,45.9".to_string())));
    }

    #[test]
    fn test_put_requires_location() {
        let result: Result<DeviceLocationPut, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }

    #[test]
    fn test_put_full_body() {
        let json = r#"{
            "location": {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [2.0, 23.0]},
                "properties": {
                    "type": "indoor",
                    "is_mobile": false,
                    "name": "hq-floor",
                    "address": "Via del Corso, Roma"
                }
            },
            "floorplan": {"floor": 2, "image": "f2.png"},
            "indoor": "100,200"
        }"#;
        let put: DeviceLocationPut = serde_json::from_str(json).unwrap();
        assert_eq!(put.location.properties.location_type, LocationType::Indoor);
        assert_eq!(put.indoor, Some("100,200".to_string()));
        assert_eq!(put.floorplan.unwrap().floor, Some(2));
    }

    #[test]
    fn test_status_serialization_matches_wire_format() {
        let status = DeviceLocationStatus {
            location: LocationFeature {
                kind: Default::default(),
                geometry: None,
                properties: crate::models::location::LocationProperties {
                    location_type: LocationType::Outdoor,
                    is_mobile: true,
                    name: "ap-1".to_string(),
                    address: String::new(),
                },
            },
            floorplan: None,
            indoor: Some(String::new()),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["location"]["type"], "Feature");
        assert!(json["location"]["geometry"].is_null());
        assert_eq!(json["location"]["properties"]["type"], "outdoor");
        assert_eq!(json["location"]["properties"]["is_mobile"], true);
        assert!(json["floorplan"].is_null());
        assert_eq!(json["indoor"], "");
    }

    #[test]
    fn test_update_request_double_option() {
        let update: UpdateDeviceLocationRequest =
            serde_json::from_str(r#"{"floorplan": null, "indoor": null}"#).unwrap();
        assert_eq!(update.floorplan, Some(None));
        assert_eq!(update.indoor, Some(None));
        assert!(update.location.is_none());
    }
}
