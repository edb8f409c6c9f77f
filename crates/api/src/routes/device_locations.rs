//! Operator endpoints for raw device-location associations.
//!
//! Unlike the single-device endpoint, these operate on association rows
//! directly, by id, with plain foreign keys in the payloads. Visibility
//! follows the owning location's organization.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::{
    CreateDeviceLocationRequest, DeviceLocationResponse, LocationType, OperatorIdentity,
    PermAction, ResourceKind, UpdateDeviceLocationRequest,
};
use domain::services::consistency::{
    ensure_floorplan_allowed, ensure_floorplan_belongs, ensure_indoor_position_allowed,
};
use persistence::entities::{DeviceLocationEntity, LocationEntity};
use persistence::repositories::{
    DeviceLocationRepository, DeviceLocationUpdate, DeviceRepository, FloorPlanRepository,
    LocationRepository,
};
use shared::pagination::{PageQuery, Paginated, DEFAULT_PAGE_SIZE};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OperatorAuth;
use crate::routes::locations::{operator_scope, require_perm};

/// GET /api/v1/devicelocation
pub async fn list_device_locations(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<DeviceLocationResponse>>, ApiError> {
    require_perm(&operator, ResourceKind::DeviceLocation, PermAction::View)?;
    let scope = operator_scope(&operator);

    let page_size = page.effective_page_size(DEFAULT_PAGE_SIZE);
    let associations = DeviceLocationRepository::new(state.pool.clone());
    let entities = associations
        .list(scope.org_filter(), page_size.into(), page.offset(page_size))
        .await?;
    let count = associations.count(scope.org_filter()).await?;

    let results = entities
        .into_iter()
        .map(|e| DeviceLocationResponse::from(domain::models::DeviceLocation::from(e)))
        .collect();
    Ok(Json(Paginated::new(count, &page, page_size, results)))
}

/// POST /api/v1/devicelocation
///
/// A device can hold at most one association; a second create for the
/// same device yields 409.
pub async fn create_device_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Json(request): Json<CreateDeviceLocationRequest>,
) -> Result<(StatusCode, Json<DeviceLocationResponse>), ApiError> {
    require_perm(&operator, ResourceKind::DeviceLocation, PermAction::Add)?;

    let device = DeviceRepository::new(state.pool.clone())
        .find_by_id(request.content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))?;
    if !operator_scope(&operator).permits(device.organization_id) {
        return Err(ApiError::NotFound("Device not found".to_string()));
    }

    let location = find_visible_location(&state, &operator, request.location).await?;
    if let Some(pin) = &request.indoor {
        ensure_indoor_position_allowed(location_type_of(&location), pin)?;
    }
    if let Some(floorplan_id) = request.floorplan {
        check_floorplan(&state, floorplan_id, &location).await?;
    }

    let created = DeviceLocationRepository::new(state.pool.clone())
        .create(
            device.id,
            location.id,
            request.floorplan,
            request.indoor.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DeviceLocationResponse::from(
            domain::models::DeviceLocation::from(created),
        )),
    ))
}

/// GET /api/v1/devicelocation/{association_id}
pub async fn get_device_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(association_id): Path<Uuid>,
) -> Result<Json<DeviceLocationResponse>, ApiError> {
    let (entity, _) = find_visible(&state, &operator, association_id).await?;
    require_perm(&operator, ResourceKind::DeviceLocation, PermAction::View)?;
    Ok(Json(DeviceLocationResponse::from(
        domain::models::DeviceLocation::from(entity),
    )))
}

/// PATCH /api/v1/devicelocation/{association_id}
///
/// `floorplan` and `indoor` accept explicit null to clear; absent fields
/// are left unchanged.
pub async fn update_device_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(association_id): Path<Uuid>,
    Json(request): Json<UpdateDeviceLocationRequest>,
) -> Result<Json<DeviceLocationResponse>, ApiError> {
    let (entity, location) = find_visible(&state, &operator, association_id).await?;
    require_perm(&operator, ResourceKind::DeviceLocation, PermAction::Change)?;

    let final_location = match request.location {
        Some(target_id) if target_id != entity.location_id => {
            find_visible_location(&state, &operator, target_id).await?
        }
        _ => location,
    };

    if let Some(Some(pin)) = &request.indoor {
        ensure_indoor_position_allowed(location_type_of(&final_location), pin)?;
    }
    if let Some(Some(floorplan_id)) = request.floorplan {
        check_floorplan(&state, floorplan_id, &final_location).await?;
    }

    let updated = DeviceLocationRepository::new(state.pool.clone())
        .update(
            association_id,
            DeviceLocationUpdate {
                location_id: request.location,
                floorplan_id: request.floorplan,
                indoor: request.indoor,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Device location not found".to_string()))?;

    Ok(Json(DeviceLocationResponse::from(
        domain::models::DeviceLocation::from(updated),
    )))
}

/// DELETE /api/v1/devicelocation/{association_id}
pub async fn delete_device_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(association_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    find_visible(&state, &operator, association_id).await?;
    require_perm(&operator, ResourceKind::DeviceLocation, PermAction::Delete)?;

    DeviceLocationRepository::new(state.pool.clone())
        .delete(association_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetches an association with its location, mapping unknown ids and
/// foreign-tenant rows to 404.
async fn find_visible(
    state: &AppState,
    operator: &OperatorIdentity,
    association_id: Uuid,
) -> Result<(DeviceLocationEntity, LocationEntity), ApiError> {
    let entity = DeviceLocationRepository::new(state.pool.clone())
        .find_by_id(association_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device location not found".to_string()))?;
    let location = LocationRepository::new(state.pool.clone())
        .find_by_id(entity.location_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device location not found".to_string()))?;
    if !operator_scope(operator).permits(location.organization_id) {
        return Err(ApiError::NotFound("Device location not found".to_string()));
    }
    Ok((entity, location))
}

async fn find_visible_location(
    state: &AppState,
    operator: &OperatorIdentity,
    location_id: Uuid,
) -> Result<LocationEntity, ApiError> {
    let location = LocationRepository::new(state.pool.clone())
        .find_by_id(location_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;
    if !operator_scope(operator).permits(location.organization_id) {
        return Err(ApiError::NotFound("Location not found".to_string()));
    }
    Ok(location)
}

fn location_type_of(location: &LocationEntity) -> LocationType {
    LocationType::parse(&location.location_type).unwrap_or(LocationType::Outdoor)
}

/// Validates a floor plan reference against the association's location:
/// the plan must exist, the location must be indoor, and the plan must
/// be anchored to that same location.
async fn check_floorplan(
    state: &AppState,
    floorplan_id: Uuid,
    location: &LocationEntity,
) -> Result<(), ApiError> {
    let floorplan = FloorPlanRepository::new(state.pool.clone())
        .find_by_id(floorplan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Floor plan not found".to_string()))?;
    ensure_floorplan_allowed(location_type_of(location))?;
    ensure_floorplan_belongs(floorplan.location_id, location.id)?;
    Ok(())
}
