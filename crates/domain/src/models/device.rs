//! Device domain model.
//!
//! Devices are owned by the device-management subsystem; this service
//! only needs identity, tenant ownership, and the shared secret used for
//! self-service access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub organization: Uuid,
    pub name: String,
    /// Shared secret enabling the device to manage its own location.
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Device record as returned by the devices-at-location listing.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceResponse {
    pub id: Uuid,
    pub organization: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Device> for DeviceResponse {
    fn from(d: Device) -> Self {
        Self {
            id: d.id,
            organization: d.organization,
            name: d.name,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_response_omits_key() {
        let device = Device {
            id: Uuid::new_v4(),
            organization: Uuid::new_v4(),
            name: "ap-1".to_string(),
            key: "a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response = DeviceResponse::from(device);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6"));
        assert!(json.contains("ap-1"));
    }
}
