//! Floor plan domain model and wire payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A floor image anchored to one indoor location.
///
/// `image` is an asset reference (URL or storage path); binary storage is
/// handled outside this service. `organization` is denormalized from the
/// owning location for tenant scoping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlan {
    pub id: Uuid,
    pub location: Uuid,
    pub organization: Uuid,
    /// Floor index; negative values are basement levels.
    pub floor: i32,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a floor plan via its own collection.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFloorPlanRequest {
    pub location: Uuid,
    pub floor: i32,
    #[validate(length(min = 1, message = "Image reference must not be empty"))]
    pub image: String,
}

/// Request payload for updating a floor plan (partial).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFloorPlanRequest {
    pub location: Option<Uuid>,
    pub floor: Option<i32>,
    #[validate(length(min = 1, message = "Image reference must not be empty"))]
    pub image: Option<String>,
}

/// Nested floor plan payload carried inside location and device-location
/// writes. An empty object (all fields absent) detaches the floor plan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestedFloorPlan {
    pub floor: Option<i32>,
    pub image: Option<String>,
}

impl NestedFloorPlan {
    /// An empty nested payload means "detach" on the device endpoint.
    pub fn is_empty(&self) -> bool {
        self.floor.is_none() && self.image.is_none()
    }
}

/// Floor plan summary embedded in device-location responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloorPlanInfo {
    pub id: Uuid,
    pub floor: i32,
    pub image: String,
}

impl From<&FloorPlan> for FloorPlanInfo {
    fn from(f: &FloorPlan) -> Self {
        Self {
            id: f.id,
            floor: f.floor,
            image: f.image.clone(),
        }
    }
}

/// Response payload for floor plan endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct FloorPlanResponse {
    pub id: Uuid,
    pub location: Uuid,
    pub organization: Uuid,
    pub floor: i32,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FloorPlan> for FloorPlanResponse {
    fn from(f: FloorPlan) -> Self {
        Self {
            id: f.id,
            location: f.location,
            organization: f.organization,
            floor: f.floor,
            image: f.image,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_floor_accepted() {
        let json = r#"{
            "location": "550e8400-e29b-41d4-a716-446655440000",
            "floor": -2,
            "image": "/media/floorplans/basement.jpg"
        }"#;
        let request: CreateFloorPlanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.floor, -2);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_image_rejected() {
        let request = CreateFloorPlanRequest {
            location: Uuid::new_v4(),
            floor: 1,
            image: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_nested_floorplan_empty() {
        let nested: NestedFloorPlan = serde_json::from_str("{}").unwrap();
        assert!(nested.is_empty());

        let nested: NestedFloorPlan = serde_json::from_str(r#"{"floor": 1}"#).unwrap();
        assert!(!nested.is_empty());
    }

    #[test]
    fn test_floorplan_info_from_model() {
        let floorplan = FloorPlan {
            id: Uuid::new_v4(),
            location: Uuid::new_v4(),
            organization: Uuid::new_v4(),
            floor: 3,
            image: "plan.png".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let info = FloorPlanInfo::from(&floorplan);
        assert_eq!(info.id, floorplan.id);
        assert_eq!(info.floor, 3);
        assert_eq!(info.image, "plan.png");
    }
}
