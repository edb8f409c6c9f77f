//! Location repository for database operations.

use domain::models::{LocationType, PointGeometry};
use domain::services::consistency::{classify_transition, TypeTransition};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{DeviceEntity, LocationEntity, LocationWithDeviceCountEntity};
use crate::metrics::QueryTimer;

/// Partial update for a location. `None` fields are left unchanged.
#[derive(Debug, Default, Clone)]
pub struct LocationUpdate<'a> {
    pub name: Option<&'a str>,
    pub location_type: Option<LocationType>,
    pub is_mobile: Option<bool>,
    pub address: Option<&'a str>,
    /// Outer `None` leaves the coordinate unchanged; `Some(None)` clears it.
    pub geometry: Option<Option<PointGeometry>>,
    /// Floor plan to create at the location, written in the same
    /// transaction as the location row.
    pub new_floorplan: Option<NewFloorPlan<'a>>,
}

/// Columns for a floor plan created alongside a location write.
#[derive(Debug, Clone, Copy)]
pub struct NewFloorPlan<'a> {
    pub floor: i32,
    pub image: &'a str,
}

/// Repository for location-related database operations.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new location, optionally with a floor plan. Both rows are
    /// written in one transaction.
    pub async fn create(
        &self,
        organization_id: Uuid,
        name: &str,
        location_type: LocationType,
        is_mobile: bool,
        address: &str,
        geometry: Option<&PointGeometry>,
        floorplan: Option<NewFloorPlan<'_>>,
    ) -> Result<LocationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_location");
        let result = self
            .create_inner(
                organization_id,
                name,
                location_type,
                is_mobile,
                address,
                geometry,
                floorplan,
            )
            .await;
        timer.record();
        result
    }

    async fn create_inner(
        &self,
        organization_id: Uuid,
        name: &str,
        location_type: LocationType,
        is_mobile: bool,
        address: &str,
        geometry: Option<&PointGeometry>,
        floorplan: Option<NewFloorPlan<'_>>,
    ) -> Result<LocationEntity, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, LocationEntity>(
            r#"
            INSERT INTO locations (organization_id, name, type, is_mobile, address,
                                   longitude, latitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, organization_id, name, type AS location_type, is_mobile,
                      address, longitude, latitude, created_at, updated_at
            "#,
        )
        .bind(organization_id)
        .bind(name)
        .bind(location_type.as_str())
        .bind(is_mobile)
        .bind(address)
        .bind(geometry.map(|g| g.longitude()))
        .bind(geometry.map(|g| g.latitude()))
        .fetch_one(&mut *tx)
        .await?;

        if let Some(plan) = floorplan {
            sqlx::query(
                r#"
                INSERT INTO floorplans (location_id, organization_id, floor, image)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(created.id)
            .bind(created.organization_id)
            .bind(plan.floor)
            .bind(plan.image)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Find location by UUID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_location_by_id");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT id, organization_id, name, type AS location_type, is_mobile,
                   address, longitude, latitude, created_at, updated_at
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List locations visible to the given organization scope, newest first.
    /// A `None` filter means no tenant restriction.
    pub async fn list(
        &self,
        org_filter: Option<&[Uuid]>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_locations");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT id, organization_id, name, type AS location_type, is_mobile,
                   address, longitude, latitude, created_at, updated_at
            FROM locations
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

    /// Count locations visible to the given organization scope.
    pub async fn count(&self, org_filter: Option<&[Uuid]>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_locations");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM locations
            WHERE ($1::uuid[] IS NULL OR organization_id = ANY($1))
            "#,
        )
        .bind(org_filter.map(|ids| ids.to_vec()))
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Apply a partial update to a location.
    ///
    /// Runs in a transaction: when the type changes from indoor to outdoor,
    /// the location's floor plans are deleted and any device associations
    /// pointing at them have their placement cleared, atomically with the
    /// type change itself.
    pub async fn update(
        &self,
        id: Uuid,
        update: LocationUpdate<'_>,
    ) -> Result<Option<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_location");
        let result = self.update_inner(id, update).await;
        timer.record();
        result
    }

    async fn update_inner(
        &self,
        id: Uuid,
        update: LocationUpdate<'_>,
    ) -> Result<Option<LocationEntity>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT type FROM locations WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((current_type,)) = current else {
            return Ok(None);
        };
        let current_type = LocationType::parse(&current_type).unwrap_or(LocationType::Outdoor);

        let updated = sqlx::query_as::<_, LocationEntity>(
            r#"
            UPDATE locations SET
                name = COALESCE($2, name),
                type = COALESCE($3, type),
                is_mobile = COALESCE($4, is_mobile),
                address = COALESCE($5, address),
                longitude = CASE WHEN $8 THEN $6 ELSE longitude END,
                latitude = CASE WHEN $8 THEN $7 ELSE latitude END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, organization_id, name, type AS location_type, is_mobile,
                      address, longitude, latitude, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.location_type.map(|t| t.as_str()))
        .bind(update.is_mobile)
        .bind(update.address)
        .bind(update.geometry.flatten().map(|g| g.longitude()))
        .bind(update.geometry.flatten().map(|g| g.latitude()))
        .bind(update.geometry.is_some())
        .fetch_one(&mut *tx)
        .await?;

        if classify_transition(current_type, update.location_type) == TypeTransition::ToOutdoor {
            sqlx::query(
                r#"
                UPDATE device_locations SET floorplan_id = NULL, indoor = NULL,
                       updated_at = NOW()
                WHERE location_id = $1
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                r#"
                DELETE FROM floorplans WHERE location_id = $1
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(plan) = update.new_floorplan {
            sqlx::query(
                r#"
                INSERT INTO floorplans (location_id, organization_id, floor, image)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(updated.id)
            .bind(updated.organization_id)
            .bind(plan.floor)
            .bind(plan.image)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Delete a location. Floor plans and device associations cascade at
    /// the schema level. Returns whether a row was deleted.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_location");
        let result = sqlx::query(
            r#"
            DELETE FROM locations WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }

    /// List locations that have at least one device, with the device count,
    /// for the GeoJSON listing.
    pub async fn geojson_list(
        &self,
        org_filter: Option<&[Uuid]>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LocationWithDeviceCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("geojson_list_locations");
        let result = sqlx::query_as::<_, LocationWithDeviceCountEntity>(
            r#"
            SELECT l.id, l.organization_id, l.name, l.type AS location_type,
                   l.is_mobile, l.address, l.longitude, l.latitude,
                   l.created_at, l.updated_at,
                   COUNT(dl.id) AS device_count
            FROM locations l
            JOIN device_locations dl ON dl.location_id = l.id
            WHERE ($1::uuid[] IS NULL OR l.organization_id = ANY($1))
            GROUP BY l.id
            ORDER BY l.created_at DESC
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

    /// Count locations that have at least one device.
    pub async fn geojson_count(&self, org_filter: Option<&[Uuid]>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("geojson_count_locations");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT l.id)
            FROM locations l
            JOIN device_locations dl ON dl.location_id = l.id
            WHERE ($1::uuid[] IS NULL OR l.organization_id = ANY($1))
            "#,
        )
        .bind(org_filter.map(|ids| ids.to_vec()))
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// List the devices placed at a location, newest association first.
    pub async fn devices_at(
        &self,
        location_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("devices_at_location");
        let result = sqlx::query_as::<_, DeviceEntity>(
            r#"
            SELECT d.id, d.organization_id, d.name, d.key, d.created_at, d.updated_at
            FROM devices d
            JOIN device_locations dl
                ON dl.content_type = 'device' AND dl.content_id = d.id
            WHERE dl.location_id = $1
            ORDER BY dl.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(location_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count the devices placed at a location.
    pub async fn count_devices_at(&self, location_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_devices_at_location");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM device_locations
            WHERE location_id = $1 AND content_type = 'device'
            "#,
        )
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }
}
