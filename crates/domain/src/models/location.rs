//! Location domain model and wire payloads.
//!
//! A location is a geographic point owned by one organization. Outdoor
//! locations carry a GPS coordinate; indoor locations additionally anchor
//! floor plans. The device-facing wire format is a GeoJSON Feature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::floorplan::NestedFloorPlan;

/// Location type: indoor (can anchor floor plans) or outdoor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Indoor,
    Outdoor,
}

impl LocationType {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Indoor => "indoor",
            LocationType::Outdoor => "outdoor",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "indoor" => Some(LocationType::Indoor),
            "outdoor" => Some(LocationType::Outdoor),
            _ => None,
        }
    }
}

/// Marker for the GeoJSON `"type": "Point"` member.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PointType {
    #[default]
    Point,
}

/// A GeoJSON Point geometry, coordinates ordered `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: PointType,
    pub coordinates: [f64; 2],
}

impl PointGeometry {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: PointType::Point,
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Checks coordinate ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        shared::validation::validate_longitude(self.longitude())?;
        shared::validation::validate_latitude(self.latitude())?;
        Ok(())
    }
}

/// Represents a location record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub organization: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub is_mobile: bool,
    pub address: String,
    pub geometry: Option<PointGeometry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `properties` member of a location GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationProperties {
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub is_mobile: bool,
    #[validate(length(min = 1, max = 75, message = "Name must be 1-75 characters"))]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// Marker for the GeoJSON `"type": "Feature"` member.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// A location rendered as a GeoJSON Feature (the device-endpoint wire
/// format and the PUT replace payload).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationFeature {
    #[serde(rename = "type", default)]
    pub kind: FeatureType,
    pub geometry: Option<PointGeometry>,
    #[validate(nested)]
    pub properties: LocationProperties,
}

impl LocationFeature {
    pub fn from_location(location: &Location) -> Self {
        Self {
            kind: FeatureType::Feature,
            geometry: location.geometry,
            properties: LocationProperties {
                location_type: location.location_type,
                is_mobile: location.is_mobile,
                name: location.name.clone(),
                address: location.address.clone(),
            },
        }
    }
}

/// Partial `properties` for PATCH on the device endpoint. Absent fields
/// are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LocationPropertiesPatch {
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
    pub is_mobile: Option<bool>,
    #[validate(length(min = 1, max = 75, message = "Name must be 1-75 characters"))]
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Partial location Feature for PATCH on the device endpoint.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LocationFeaturePatch {
    pub geometry: Option<PointGeometry>,
    #[validate(nested)]
    pub properties: Option<LocationPropertiesPatch>,
}

/// Request payload for creating a location via the operator collection.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocationRequest {
    pub organization: Uuid,
    #[validate(length(min = 1, max = 75, message = "Name must be 1-75 characters"))]
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    #[serde(default)]
    pub is_mobile: bool,
    #[serde(default)]
    pub address: String,
    pub geometry: Option<PointGeometry>,
    /// Optional nested floor plan, only valid for indoor locations.
    pub floorplan: Option<NestedFloorPlan>,
}

/// Request payload for updating a location (partial).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1, max = 75, message = "Name must be 1-75 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
    pub is_mobile: Option<bool>,
    pub address: Option<String>,
    pub geometry: Option<PointGeometry>,
    /// Optional nested floor plan, only valid for indoor locations.
    pub floorplan: Option<NestedFloorPlan>,
}

/// Response payload for operator location endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    pub id: Uuid,
    pub organization: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub is_mobile: bool,
    pub address: String,
    pub geometry: Option<PointGeometry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Location> for LocationResponse {
    fn from(l: Location) -> Self {
        Self {
            id: l.id,
            organization: l.organization,
            name: l.name,
            location_type: l.location_type,
            is_mobile: l.is_mobile,
            address: l.address,
            geometry: l.geometry,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

/// One feature of the GeoJSON location listing, annotated with the
/// number of devices associated to the location.
#[derive(Debug, Clone, Serialize)]
pub struct GeoJsonLocationFeature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub id: Uuid,
    pub geometry: Option<PointGeometry>,
    pub properties: GeoJsonLocationProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoJsonLocationProperties {
    pub organization: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub is_mobile: bool,
    pub address: String,
    pub device_count: i64,
}

/// GeoJSON FeatureCollection wrapper for the location listing.
#[derive(Debug, Clone, Serialize)]
pub struct GeoJsonLocationCollection {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    pub count: i64,
    pub features: Vec<GeoJsonLocationFeature>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum FeatureCollectionType {
    #[default]
    FeatureCollection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_type_roundtrip() {
        assert_eq!(LocationType::parse("indoor"), Some(LocationType::Indoor));
        assert_eq!(LocationType::parse("outdoor"), Some(LocationType::Outdoor));
        assert_eq!(LocationType::parse("underwater"), None);
        assert_eq!(LocationType::Indoor.as_str(), "indoor");
        assert_eq!(LocationType::Outdoor.as_str(), "outdoor");
    }

    #[test]
    fn test_location_type_serde() {
        assert_eq!(
            serde_json::to_string(&LocationType::Indoor).unwrap(),
            "\"indoor\""
        );
        let t: LocationType = serde_json::from_str("\"outdoor\"").unwrap();
        assert_eq!(t, LocationType::Outdoor);
    }

    #[test]
    fn test_point_geometry_serialization() {
        let point = PointGeometry::new(12.512124, 41.898903);
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 12.512124);
        assert_eq!(json["coordinates"][1], 41.898903);
    }

    #[test]
    fn test_point_geometry_deserialization() {
        let point: PointGeometry =
            serde_json::from_str(r#"{"type": "Point", "coordinates": [2.0, 23.0]}"#).unwrap();
        assert_eq!(point.longitude(), 2.0);
        assert_eq!(point.latitude(), 23.0);
    }

    #[test]
    fn test_point_geometry_rejects_other_types() {
        let result: Result<PointGeometry, _> =
            serde_json::from_str(r#"{"type": "LineString", "coordinates": [2.0, 23.0]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_point_geometry_validate() {
        assert!(PointGeometry::new(12.0, 41.0).validate().is_ok());
        assert!(PointGeometry::new(200.0, 41.0).validate().is_err());
        assert!(PointGeometry::new(12.0, 95.0).validate().is_err());
    }

    #[test]
    fn test_location_feature_deserialization() {
        let json = r#"{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [12.512124, 41.898903]},
            "properties": {
                "type": "outdoor",
                "is_mobile": false,
                "name": "Via del Corso",
                "address": "Via del Corso, Roma, Italia"
            }
        }"#;
        let feature: LocationFeature = serde_json::from_str(json).unwrap();
        assert_eq!(feature.properties.location_type, LocationType::Outdoor);
        assert!(!feature.properties.is_mobile);
        assert_eq!(feature.properties.name, "Via del Corso");
        assert!(feature.geometry.is_some());
    }

    #[test]
    fn test_location_feature_null_geometry() {
        let json = r#"{
            "type": "Feature",
            "geometry": null,
            "properties": {"type": "outdoor", "is_mobile": true, "name": "ap-7"}
        }"#;
        let feature: LocationFeature = serde_json::from_str(json).unwrap();
        assert!(feature.geometry.is_none());
        assert_eq!(feature.properties.address, "");
    }

    #[test]
    fn test_location_feature_patch_partial() {
        let json = r#"{"properties": {"type": "outdoor"}}"#;
        let patch: LocationFeaturePatch = serde_json::from_str(json).unwrap();
        assert!(patch.geometry.is_none());
        let props = patch.properties.unwrap();
        assert_eq!(props.location_type, Some(LocationType::Outdoor));
        assert!(props.name.is_none());
        assert!(props.is_mobile.is_none());
    }

    #[test]
    fn test_create_location_request_defaults() {
        let json = r#"{
            "organization": "550e8400-e29b-41d4-a716-446655440000",
            "name": "hq",
            "type": "outdoor"
        }"#;
        let request: CreateLocationRequest = serde_json::from_str(json).unwrap();
        assert!(!request.is_mobile);
        assert_eq!(request.address, "");
        assert!(request.geometry.is_none());
        assert!(request.floorplan.is_none());
    }

    #[test]
    fn test_create_location_request_name_validation() {
        let request = CreateLocationRequest {
            organization: Uuid::new_v4(),
            name: String::new(),
            location_type: LocationType::Outdoor,
            is_mobile: false,
            address: String::new(),
            geometry: None,
            floorplan: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_geojson_collection_serialization() {
        let collection = GeoJsonLocationCollection {
            kind: FeatureCollectionType::FeatureCollection,
            count: 1,
            features: vec![GeoJsonLocationFeature {
                kind: FeatureType::Feature,
                id: Uuid::new_v4(),
                geometry: Some(PointGeometry::new(2.0, 23.0)),
                properties: GeoJsonLocationProperties {
                    organization: Uuid::new_v4(),
                    name: "hq".to_string(),
                    location_type: LocationType::Outdoor,
                    is_mobile: false,
                    address: String::new(),
                    device_count: 3,
                },
            }],
        };
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["type"], "Feature");
        assert_eq!(json["features"][0]["properties"]["device_count"], 3);
    }
}
