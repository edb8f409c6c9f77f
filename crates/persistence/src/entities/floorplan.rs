//! Floor plan entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::FloorPlan;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the floorplans table.
#[derive(Debug, Clone, FromRow)]
pub struct FloorPlanEntity {
    pub id: Uuid,
    pub location_id: Uuid,
    pub organization_id: Uuid,
    pub floor: i32,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FloorPlanEntity> for FloorPlan {
    fn from(entity: FloorPlanEntity) -> Self {
        Self {
            id: entity.id,
            location: entity.location_id,
            organization: entity.organization_id,
            floor: entity.floor,
            image: entity.image,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
