//! Floor plan repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::FloorPlanEntity;
use crate::metrics::QueryTimer;

/// Repository for floor plan operations.
#[derive(Clone)]
pub struct FloorPlanRepository {
    pool: PgPool,
}

impl FloorPlanRepository {
    /// Creates a new FloorPlanRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new floor plan for a location.
    pub async fn create(
        &self,
        location_id: Uuid,
        organization_id: Uuid,
        floor: i32,
        image: &str,
    ) -> Result<FloorPlanEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_floorplan");
        let result = sqlx::query_as::<_, FloorPlanEntity>(
            r#"
            INSERT INTO floorplans (location_id, organization_id, floor, image)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(location_id)
        .bind(organization_id)
        .bind(floor)
        .bind(image)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find floor plan by UUID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FloorPlanEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_floorplan_by_id");
        let result = sqlx::query_as::<_, FloorPlanEntity>(
            r#"
            SELECT * FROM floorplans WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List floor plans visible to the given organization scope, newest first.
    pub async fn list(
        &self,
        org_filter: Option<&[Uuid]>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FloorPlanEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_floorplans");
        let result = sqlx::query_as::<_, FloorPlanEntity>(
            r#"
            SELECT * FROM floorplans
            WHERE ($1::uuid[] IS NULL OR organization_id = ANY($1))
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(org_filter.map(|ids| ids.to_vec()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count floor plans visible to the given organization scope.
    pub async fn count(&self, org_filter: Option<&[Uuid]>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_floorplans");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM floorplans
            WHERE ($1::uuid[] IS NULL OR organization_id = ANY($1))
            "#,
        )
        .bind(org_filter.map(|ids| ids.to_vec()))
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Apply a partial update to a floor plan.
    pub async fn update(
        &self,
        id: Uuid,
        floor: Option<i32>,
        image: Option<&str>,
    ) -> Result<Option<FloorPlanEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_floorplan");
        let result = sqlx::query_as::<_, FloorPlanEntity>(
            r#"
            UPDATE floorplans SET
                floor = COALESCE($2, floor),
                image = COALESCE($3, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(floor)
        .bind(image)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Move a floor plan to another location, keeping the denormalized
    /// organization in sync with the new anchor.
    pub async fn relocate(
        &self,
        id: Uuid,
        location_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<FloorPlanEntity>, sqlx::Error> {
        let timer = QueryTimer::new("relocate_floorplan");
        let result = sqlx::query_as::<_, FloorPlanEntity>(
            r#"
            UPDATE floorplans SET
                location_id = $2,
                organization_id = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(location_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a floor plan. Associations pointing at it fall back to NULL
    /// at the schema level. Returns whether a row was deleted.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_floorplan");
        let result = sqlx::query(
            r#"
            DELETE FROM floorplans WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }
}
