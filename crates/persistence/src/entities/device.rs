//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeviceEntity> for domain::models::Device {
    fn from(entity: DeviceEntity) -> Self {
        Self {
            id: entity.id,
            organization: entity.organization_id,
            name: entity.name,
            key: entity.key,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_entity_to_domain() {
        let entity = DeviceEntity {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "ap-42".to_string(),
            key: "a".repeat(32),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let device: domain::models::Device = entity.clone().into();
        assert_eq!(device.id, entity.id);
        assert_eq!(device.organization, entity.organization_id);
        assert_eq!(device.name, "ap-42");
        assert_eq!(device.key, entity.key);
    }
}
