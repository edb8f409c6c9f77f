//! Device location association repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{DeviceEntity, DeviceLocationEntity, LocationEntity};
use crate::metrics::QueryTimer;

/// Partial update for an association. Outer `None` leaves the field
/// unchanged; `Some(None)` clears it.
#[derive(Debug, Default, Clone)]
pub struct DeviceLocationUpdate {
    pub location_id: Option<Uuid>,
    pub floorplan_id: Option<Option<Uuid>>,
    pub indoor: Option<Option<String>>,
}

/// Repository for device-to-location associations.
#[derive(Clone)]
pub struct DeviceLocationRepository {
    pool: PgPool,
}

impl DeviceLocationRepository {
    /// Creates a new DeviceLocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new association.
    pub async fn create(
        &self,
        device_id: Uuid,
        location_id: Uuid,
        floorplan_id: Option<Uuid>,
        indoor: Option<&str>,
    ) -> Result<DeviceLocationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_device_location");
        let result = sqlx::query_as::<_, DeviceLocationEntity>(
            r#"
            INSERT INTO device_locations (content_type, content_id, location_id,
                                          floorplan_id, indoor)
            VALUES ('device', $1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(device_id)
        .bind(location_id)
        .bind(floorplan_id)
        .bind(indoor)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find association by UUID.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<DeviceLocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_location_by_id");
        let result = sqlx::query_as::<_, DeviceLocationEntity>(
            r#"
            SELECT * FROM device_locations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the association owned by a device, if any.
    pub async fn find_by_device(
        &self,
        device_id: Uuid,
    ) -> Result<Option<DeviceLocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_location_by_device");
        let result = sqlx::query_as::<_, DeviceLocationEntity>(
            r#"
            SELECT * FROM device_locations
            WHERE content_type = 'device' AND content_id = $1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Fetch a device's association together with its location, creating
    /// both when the device has none yet. The boolean reports whether a
    /// new pair was provisioned.
    ///
    /// The provisioned location is outdoor and mobile, named after the
    /// device, in the device's organization, with no coordinate. The unique
    /// constraint on the owner serializes concurrent provisioning: the loser
    /// of a race rolls back its insert and reads the winner's rows.
    pub async fn get_or_provision(
        &self,
        device: &DeviceEntity,
    ) -> Result<(DeviceLocationEntity, LocationEntity, bool), sqlx::Error> {
        let timer = QueryTimer::new("get_or_provision_device_location");
        let result = self.get_or_provision_inner(device).await;
        timer.record();
        result
    }

    async fn get_or_provision_inner(
        &self,
        device: &DeviceEntity,
    ) -> Result<(DeviceLocationEntity, LocationEntity, bool), sqlx::Error> {
        if let Some((association, location)) = self.find_with_location(device.id).await? {
            return Ok((association, location, false));
        }

        let mut tx = self.pool.begin().await?;
        let location = sqlx::query_as::<_, LocationEntity>(
            r#"
            INSERT INTO locations (organization_id, name, type, is_mobile, address)
            VALUES ($1, $2, 'outdoor', TRUE, '')
            RETURNING id, organization_id, name, type AS location_type, is_mobile,
                      address, longitude, latitude, created_at, updated_at
            "#,
        )
        .bind(device.organization_id)
        .bind(&device.name)
        .fetch_one(&mut *tx)
        .await?;

        let inserted = sqlx::query_as::<_, DeviceLocationEntity>(
            r#"
            INSERT INTO device_locations (content_type, content_id, location_id, indoor)
            VALUES ('device', $1, $2, '')
            ON CONFLICT (content_type, content_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(device.id)
        .bind(location.id)
        .fetch_optional(&mut *tx)
        .await?;

        match inserted {
            Some(association) => {
                tx.commit().await?;
                Ok((association, location, true))
            }
            None => {
                // Lost the provisioning race; discard our location and use
                // the winner's rows.
                tx.rollback().await?;
                let (association, location) = self
                    .find_with_location(device.id)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((association, location, false))
            }
        }
    }

    async fn find_with_location(
        &self,
        device_id: Uuid,
    ) -> Result<Option<(DeviceLocationEntity, LocationEntity)>, sqlx::Error> {
        let Some(association) = self.find_by_device(device_id).await? else {
            return Ok(None);
        };
        let location = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT id, organization_id, name, type AS location_type, is_mobile,
                   address, longitude, latitude, created_at, updated_at
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(association.location_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Some((association, location)))
    }

    /// List associations visible to the given organization scope, newest
    /// first. Visibility follows the owning location's organization.
    pub async fn list(
        &self,
        org_filter: Option<&[Uuid]>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DeviceLocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_device_locations");
        let result = sqlx::query_as::<_, DeviceLocationEntity>(
            r#"
            SELECT dl.id, dl.content_type, dl.content_id, dl.location_id,
                   dl.floorplan_id, dl.indoor, dl.created_at, dl.updated_at
            FROM device_locations dl
            JOIN locations l ON l.id = dl.location_id
            WHERE ($1::uuid[] IS NULL OR l.organization_id = ANY($1))
            ORDER BY dl.created_at DESC
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

    /// Count associations visible to the given organization scope.
    pub async fn count(&self, org_filter: Option<&[Uuid]>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_device_locations");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM device_locations dl
            JOIN locations l ON l.id = dl.location_id
            WHERE ($1::uuid[] IS NULL OR l.organization_id = ANY($1))
            "#,
        )
        .bind(org_filter.map(|ids| ids.to_vec()))
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Apply a partial update to an association.
    pub async fn update(
        &self,
        id: Uuid,
        update: DeviceLocationUpdate,
    ) -> Result<Option<DeviceLocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_device_location");
        let result = sqlx::query_as::<_, DeviceLocationEntity>(
            r#"
            UPDATE device_locations SET
                location_id = COALESCE($2, location_id),
                floorplan_id = CASE WHEN $3 THEN $4 ELSE floorplan_id END,
                indoor = CASE WHEN $5 THEN $6 ELSE indoor END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.location_id)
        .bind(update.floorplan_id.is_some())
        .bind(update.floorplan_id.flatten())
        .bind(update.indoor.is_some())
        .bind(update.indoor.flatten())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete an association. Returns whether a row was deleted.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_device_location");
        let result = sqlx::query(
            r#"
            DELETE FROM device_locations WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }
}
