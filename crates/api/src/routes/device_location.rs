//! The single-device location endpoint.
//!
//! `/api/v1/device/{device_id}/location` is the self-service surface:
//! a device may read and report its own placement using its key as a
//! bearer secret in the `key` query parameter, and operators may manage
//! the same resource with their credentials. GET and PUT auto-provision
//! a location for devices that have none yet; PATCH and DELETE require
//! an existing association.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    AuthState, DeviceLocationPatch, DeviceLocationPut, DeviceLocationStatus, FloorPlanInfo,
    LocationFeature, LocationType, OperatorIdentity, PermAction, ResourceKind,
};
use domain::services::access::{evaluate, AccessRequest, DEVICE_ENDPOINT_CHECKERS};
use domain::services::consistency::{
    ensure_indoor_position_allowed, validate_floorplan_write, NestedWriteContext,
};
use persistence::entities::{DeviceEntity, DeviceLocationEntity, LocationEntity};
use persistence::repositories::{
    DeviceLocationRepository, DeviceLocationUpdate, DeviceRepository, FloorPlanRepository,
    LocationRepository, LocationUpdate,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{KeyQuery, OptionalOperator};
use crate::middleware::metrics::{record_device_key_rejected, record_location_provisioned};

/// GET /api/v1/device/{device_id}/location
///
/// Returns the device's placement, provisioning an outdoor mobile
/// location on first access.
pub async fn get_device_location(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Query(key): Query<KeyQuery>,
    OptionalOperator(operator): OptionalOperator,
) -> Result<Json<DeviceLocationStatus>, ApiError> {
    let device = find_device(&state, device_id).await?;
    authorize(
        &state,
        &device,
        key.key.as_deref(),
        operator.as_ref(),
        PermAction::View,
    )?;

    let (association, location, provisioned) = DeviceLocationRepository::new(state.pool.clone())
        .get_or_provision(&device)
        .await?;
    if provisioned {
        record_location_provisioned();
    }

    build_status(&state, &association, location).await
}

/// PUT /api/v1/device/{device_id}/location
///
/// Full replace of the device's placement. Provisions first if needed,
/// so a device's first report can be a PUT.
pub async fn put_device_location(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Query(key): Query<KeyQuery>,
    OptionalOperator(operator): OptionalOperator,
    Json(body): Json<DeviceLocationPut>,
) -> Result<Json<DeviceLocationStatus>, ApiError> {
    body.validate()?;
    if let Some(geometry) = &body.location.geometry {
        geometry.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    }

    let device = find_device(&state, device_id).await?;
    authorize(
        &state,
        &device,
        key.key.as_deref(),
        operator.as_ref(),
        PermAction::Change,
    )?;

    let device_locations = DeviceLocationRepository::new(state.pool.clone());
    let (association, location, provisioned) = device_locations.get_or_provision(&device).await?;
    if provisioned {
        record_location_provisioned();
    }

    let final_type = body.location.properties.location_type;

    if let Some(pin) = &body.indoor {
        ensure_indoor_position_allowed(final_type, pin)?;
    }

    // Rule: floor plans only on indoor locations, checked against the
    // post-write type, before anything is written.
    let floorplan_requested = body
        .floorplan
        .as_ref()
        .map(|nested| !nested.is_empty())
        .unwrap_or(false);
    if floorplan_requested {
        let anchor = existing_floorplan_anchor(&state, &association).await?;
        validate_floorplan_write(
            &NestedWriteContext {
                location_id: location.id,
                location_type: final_type,
            },
            anchor,
        )?;
    }

    let properties = &body.location.properties;
    let updated_location = LocationRepository::new(state.pool.clone())
        .update(
            location.id,
            LocationUpdate {
                name: Some(&properties.name),
                location_type: Some(final_type),
                is_mobile: Some(properties.is_mobile),
                address: Some(&properties.address),
                // Full replace: an absent geometry clears the coordinate.
                geometry: Some(body.location.geometry),
                new_floorplan: None,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;

    // Refetch: the type cascade may have cleared the placement.
    let association = device_locations
        .find_by_id(association.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device location not found".to_string()))?;

    let mut update = DeviceLocationUpdate {
        indoor: Some(body.indoor.clone()),
        ..Default::default()
    };

    match &body.floorplan {
        Some(nested) if nested.is_empty() => {
            update.floorplan_id = Some(None);
            update.indoor = Some(None);
        }
        Some(nested) => {
            let floorplan_id =
                write_nested_floorplan(&state, &association, &updated_location, nested).await?;
            update.floorplan_id = Some(Some(floorplan_id));
        }
        None if final_type == LocationType::Outdoor => {
            update.floorplan_id = Some(None);
            update.indoor = Some(None);
        }
        None => {}
    }

    let association = device_locations
        .update(association.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device location not found".to_string()))?;

    build_status(&state, &association, updated_location).await
}

/// PATCH /api/v1/device/{device_id}/location
///
/// Partial update. Unlike GET and PUT, never provisions: a device with
/// no placement yields 404.
pub async fn patch_device_location(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Query(key): Query<KeyQuery>,
    OptionalOperator(operator): OptionalOperator,
    Json(body): Json<DeviceLocationPatch>,
) -> Result<Json<DeviceLocationStatus>, ApiError> {
    body.validate()?;
    if let Some(geometry) = body.location.as_ref().and_then(|l| l.geometry.as_ref()) {
        geometry.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    }

    let device = find_device(&state, device_id).await?;
    authorize(
        &state,
        &device,
        key.key.as_deref(),
        operator.as_ref(),
        PermAction::Change,
    )?;

    let device_locations = DeviceLocationRepository::new(state.pool.clone());
    let Some(association) = device_locations.find_by_device(device.id).await? else {
        return Err(ApiError::NotFound("Device has no location".to_string()));
    };
    let locations = LocationRepository::new(state.pool.clone());
    let location = locations
        .find_by_id(association.location_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;

    let current_type =
        LocationType::parse(&location.location_type).unwrap_or(LocationType::Outdoor);
    let requested_type = body
        .location
        .as_ref()
        .and_then(|l| l.properties.as_ref())
        .and_then(|p| p.location_type);
    let final_type = requested_type.unwrap_or(current_type);

    if let Some(Some(pin)) = &body.indoor {
        ensure_indoor_position_allowed(final_type, pin)?;
    }

    let floorplan_requested = matches!(&body.floorplan, Some(Some(nested)) if !nested.is_empty());
    if floorplan_requested {
        let anchor = existing_floorplan_anchor(&state, &association).await?;
        validate_floorplan_write(
            &NestedWriteContext {
                location_id: location.id,
                location_type: final_type,
            },
            anchor,
        )?;
    }

    let updated_location = if let Some(feature) = &body.location {
        let properties = feature.properties.clone().unwrap_or_default();
        locations
            .update(
                location.id,
                LocationUpdate {
                    name: properties.name.as_deref(),
                    location_type: properties.location_type,
                    is_mobile: properties.is_mobile,
                    address: properties.address.as_deref(),
                    geometry: feature.geometry.map(Some),
                    new_floorplan: None,
                },
            )
            .await?
            .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?
    } else {
        location
    };

    // Refetch after a possible type cascade.
    let association = device_locations
        .find_by_id(association.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device location not found".to_string()))?;

    let mut update = DeviceLocationUpdate {
        indoor: body.indoor.clone(),
        ..Default::default()
    };

    match &body.floorplan {
        Some(Some(nested)) if nested.is_empty() => {
            update.floorplan_id = Some(None);
            update.indoor = Some(None);
        }
        Some(Some(nested)) => {
            let floorplan_id =
                write_nested_floorplan(&state, &association, &updated_location, nested).await?;
            update.floorplan_id = Some(Some(floorplan_id));
        }
        Some(None) => {
            update.floorplan_id = Some(None);
            update.indoor = Some(None);
        }
        None => {}
    }

    let association = device_locations
        .update(association.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device location not found".to_string()))?;

    build_status(&state, &association, updated_location).await
}

/// DELETE /api/v1/device/{device_id}/location
///
/// Removes the association. The location itself survives; it may be
/// shared with other devices.
pub async fn delete_device_location(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Query(key): Query<KeyQuery>,
    OptionalOperator(operator): OptionalOperator,
) -> Result<StatusCode, ApiError> {
    let device = find_device(&state, device_id).await?;
    authorize(
        &state,
        &device,
        key.key.as_deref(),
        operator.as_ref(),
        PermAction::Delete,
    )?;

    let device_locations = DeviceLocationRepository::new(state.pool.clone());
    let Some(association) = device_locations.find_by_device(device.id).await? else {
        return Err(ApiError::NotFound("Device has no location".to_string()));
    };
    device_locations.delete(association.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_device(state: &AppState, device_id: Uuid) -> Result<DeviceEntity, ApiError> {
    DeviceRepository::new(state.pool.clone())
        .find_by_id(device_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))
}

/// Runs the dual authorization pipeline for the device endpoint.
///
/// Key guesses are throttled per target device before the comparison.
/// Denials map to 403 for key-tier callers and anonymous callers, and to
/// 404 for authenticated operators outside the owning organization, so
/// the endpoint does not reveal which devices exist to foreign tenants.
fn authorize(
    state: &AppState,
    device: &DeviceEntity,
    presented_key: Option<&str>,
    operator: Option<&OperatorIdentity>,
    action: PermAction,
) -> Result<(), ApiError> {
    if presented_key.is_some() {
        if let Some(limiter) = &state.key_limiter {
            if limiter.check(device.id).is_err() {
                return Err(ApiError::RateLimited);
            }
        }
    }

    let auth = match operator {
        Some(op) => AuthState::Operator(op.clone()),
        None => AuthState::Unauthenticated,
    };

    let request = AccessRequest {
        auth: &auth,
        presented_key,
        device_key: Some(device.key.trim_end()),
        organization: Some(device.organization_id),
        resource: ResourceKind::DeviceLocation,
        action,
    };

    if evaluate(DEVICE_ENDPOINT_CHECKERS, &request) {
        return Ok(());
    }

    if presented_key.is_some() {
        record_device_key_rejected();
        Err(ApiError::Forbidden("Invalid device key".to_string()))
    } else if let Some(op) = operator {
        // Members who lack the model permission get 403; only foreign
        // tenants get the concealing 404.
        if op.is_member(device.organization_id) {
            Err(ApiError::Forbidden("Permission denied".to_string()))
        } else {
            Err(ApiError::NotFound("Device not found".to_string()))
        }
    } else {
        Err(ApiError::Forbidden("Authentication required".to_string()))
    }
}

async fn existing_floorplan_anchor(
    state: &AppState,
    association: &DeviceLocationEntity,
) -> Result<Option<Uuid>, ApiError> {
    let Some(floorplan_id) = association.floorplan_id else {
        return Ok(None);
    };
    let floorplan = FloorPlanRepository::new(state.pool.clone())
        .find_by_id(floorplan_id)
        .await?;
    Ok(floorplan.map(|f| f.location_id))
}

/// Creates or updates the floor plan attached to the association and
/// returns its id. A create requires both `floor` and `image`.
async fn write_nested_floorplan(
    state: &AppState,
    association: &DeviceLocationEntity,
    location: &LocationEntity,
    nested: &domain::models::NestedFloorPlan,
) -> Result<Uuid, ApiError> {
    let floorplans = FloorPlanRepository::new(state.pool.clone());

    if let Some(floorplan_id) = association.floorplan_id {
        let updated = floorplans
            .update(floorplan_id, nested.floor, nested.image.as_deref())
            .await?
            .ok_or_else(|| ApiError::NotFound("Floor plan not found".to_string()))?;
        return Ok(updated.id);
    }

    let (Some(floor), Some(image)) = (nested.floor, nested.image.as_deref()) else {
        return Err(ApiError::Validation(
            "floor and image are required to create a floor plan".to_string(),
        ));
    };
    let created = floorplans
        .create(location.id, location.organization_id, floor, image)
        .await?;
    Ok(created.id)
}

async fn build_status(
    state: &AppState,
    association: &DeviceLocationEntity,
    location: LocationEntity,
) -> Result<Json<DeviceLocationStatus>, ApiError> {
    let floorplan = match association.floorplan_id {
        Some(floorplan_id) => FloorPlanRepository::new(state.pool.clone())
            .find_by_id(floorplan_id)
            .await?
            .map(|entity| {
                let model: domain::models::FloorPlan = entity.into();
                FloorPlanInfo::from(&model)
            }),
        None => None,
    };

    let location: domain::models::Location = location.into();
    Ok(Json(DeviceLocationStatus {
        location: LocationFeature::from_location(&location),
        floorplan,
        indoor: association.indoor.clone(),
    }))
}
