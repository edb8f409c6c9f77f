//! Location entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Location, LocationType, PointGeometry};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the locations table.
///
/// Queries alias the `type` column as `location_type`; the coordinate pair
/// is either fully present or fully NULL (enforced by a table constraint).
#[derive(Debug, Clone, FromRow)]
pub struct LocationEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub location_type: String,
    pub is_mobile: bool,
    pub address: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LocationEntity> for Location {
    fn from(entity: LocationEntity) -> Self {
        let geometry = match (entity.longitude, entity.latitude) {
            (Some(lon), Some(lat)) => Some(PointGeometry::new(lon, lat)),
            _ => None,
        };
        Self {
            id: entity.id,
            organization: entity.organization_id,
            name: entity.name,
            location_type: LocationType::parse(&entity.location_type)
                .unwrap_or(LocationType::Outdoor),
            is_mobile: entity.is_mobile,
            address: entity.address,
            geometry,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Location row joined with the number of devices placed at it, used by
/// the public GeoJSON listing.
#[derive(Debug, Clone, FromRow)]
pub struct LocationWithDeviceCountEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub location_type: String,
    pub is_mobile: bool,
    pub address: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub device_count: i64,
}

impl LocationWithDeviceCountEntity {
    pub fn into_parts(self) -> (Location, i64) {
        let count = self.device_count;
        let location = LocationEntity {
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            location_type: self.location_type,
            is_mobile: self.is_mobile,
            address: self.address,
            longitude: self.longitude,
            latitude: self.latitude,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into();
        (location, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(lon: Option<f64>, lat: Option<f64>) -> LocationEntity {
        LocationEntity {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "hq".to_string(),
            location_type: "indoor".to_string(),
            is_mobile: false,
            address: "Via Roma 1".to_string(),
            longitude: lon,
            latitude: lat,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_location_entity_with_geometry() {
        let location: Location = entity(Some(12.51), Some(41.89)).into();
        assert_eq!(location.location_type, LocationType::Indoor);
        let geometry = location.geometry.unwrap();
        assert_eq!(geometry.longitude(), 12.51);
        assert_eq!(geometry.latitude(), 41.89);
    }

    #[test]
    fn test_location_entity_without_geometry() {
        let location: Location = entity(None, None).into();
        assert!(location.geometry.is_none());
    }
}
