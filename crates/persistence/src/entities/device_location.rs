//! Device location association entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ContentKind, ContentRef, DeviceLocation};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the device_locations table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceLocationEntity {
    pub id: Uuid,
    pub content_type: String,
    pub content_id: Uuid,
    pub location_id: Uuid,
    pub floorplan_id: Option<Uuid>,
    pub indoor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeviceLocationEntity> for DeviceLocation {
    fn from(entity: DeviceLocationEntity) -> Self {
        // A table constraint limits content_type to known kinds.
        let kind = ContentKind::parse(&entity.content_type).unwrap_or(ContentKind::Device);
        Self {
            id: entity.id,
            content_object: ContentRef {
                kind,
                id: entity.content_id,
            },
            location: entity.location_id,
            floorplan: entity.floorplan_id,
            indoor: entity.indoor,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_location_entity_to_domain() {
        let device_id = Uuid::new_v4();
        let entity = DeviceLocationEntity {
            id: Uuid::new_v4(),
            content_type: "device".to_string(),
            content_id: device_id,
            location_id: Uuid::new_v4(),
            floorplan_id: None,
            indoor: Some(String::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let association: DeviceLocation = entity.into();
        assert_eq!(association.content_object, ContentRef::device(device_id));
        assert_eq!(association.indoor.as_deref(), Some(""));
    }
}
