//! Operator location endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    CreateLocationRequest, DeviceResponse, GeoJsonLocationCollection, GeoJsonLocationFeature,
    GeoJsonLocationProperties, LocationResponse, LocationType, NestedFloorPlan, OperatorIdentity,
    PermAction, ResourceKind, UpdateLocationRequest,
};
use domain::services::consistency::ensure_floorplan_allowed;
use domain::services::scope::{self, OrgScope};
use persistence::entities::LocationEntity;
use persistence::repositories::{LocationRepository, LocationUpdate, NewFloorPlan};
use shared::pagination::{PageQuery, Paginated, DEFAULT_PAGE_SIZE};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OperatorAuth;

/// Default page size for the GeoJSON listing, which map clients consume
/// in bulk.
const GEOJSON_PAGE_SIZE: u32 = 1000;

/// GET /api/v1/location
pub async fn list_locations(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<LocationResponse>>, ApiError> {
    require_perm(&operator, ResourceKind::Location, PermAction::View)?;
    let scope = operator_scope(&operator);

    let page_size = page.effective_page_size(DEFAULT_PAGE_SIZE);
    let locations = LocationRepository::new(state.pool.clone());
    let entities = locations
        .list(scope.org_filter(), page_size.into(), page.offset(page_size))
        .await?;
    let count = locations.count(scope.org_filter()).await?;

    let results = entities
        .into_iter()
        .map(|e| LocationResponse::from(domain::models::Location::from(e)))
        .collect();
    Ok(Json(Paginated::new(count, &page, page_size, results)))
}

/// POST /api/v1/location
pub async fn create_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Json(request): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<LocationResponse>), ApiError> {
    request.validate()?;
    if let Some(geometry) = &request.geometry {
        geometry
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    }

    require_perm(&operator, ResourceKind::Location, PermAction::Add)?;
    if !operator_scope(&operator).permits(request.organization) {
        return Err(ApiError::Forbidden(
            "Not a member of the target organization".to_string(),
        ));
    }

    // A nested floor plan is only valid on an indoor location. It is
    // written in the same transaction as the location row.
    let floorplan = nested_floorplan(&request.floorplan, request.location_type)?;

    let created = LocationRepository::new(state.pool.clone())
        .create(
            request.organization,
            &request.name,
            request.location_type,
            request.is_mobile,
            &request.address,
            request.geometry.as_ref(),
            floorplan,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LocationResponse::from(domain::models::Location::from(
            created,
        ))),
    ))
}

/// GET /api/v1/location/{location_id}
pub async fn get_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(location_id): Path<Uuid>,
) -> Result<Json<LocationResponse>, ApiError> {
    let entity = find_visible(&state, &operator, location_id).await?;
    require_perm(&operator, ResourceKind::Location, PermAction::View)?;
    Ok(Json(LocationResponse::from(domain::models::Location::from(
        entity,
    ))))
}

/// PATCH /api/v1/location/{location_id}
///
/// Changing the type from indoor to outdoor cascades: the location's
/// floor plans are deleted and referencing associations cleared, in the
/// same transaction.
pub async fn update_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(location_id): Path<Uuid>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<LocationResponse>, ApiError> {
    request.validate()?;
    if let Some(geometry) = &request.geometry {
        geometry
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    }

    let entity = find_visible(&state, &operator, location_id).await?;
    require_perm(&operator, ResourceKind::Location, PermAction::Change)?;

    let current_type =
        LocationType::parse(&entity.location_type).unwrap_or(LocationType::Outdoor);
    let final_type = request.location_type.unwrap_or(current_type);

    let floorplan = nested_floorplan(&request.floorplan, final_type)?;

    let locations = LocationRepository::new(state.pool.clone());
    let updated = locations
        .update(
            location_id,
            LocationUpdate {
                name: request.name.as_deref(),
                location_type: request.location_type,
                is_mobile: request.is_mobile,
                address: request.address.as_deref(),
                geometry: request.geometry.map(Some),
                new_floorplan: floorplan,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;

    Ok(Json(LocationResponse::from(domain::models::Location::from(
        updated,
    ))))
}

/// DELETE /api/v1/location/{location_id}
pub async fn delete_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(location_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    find_visible(&state, &operator, location_id).await?;
    require_perm(&operator, ResourceKind::Location, PermAction::Delete)?;

    LocationRepository::new(state.pool.clone())
        .delete(location_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/location/geojson
///
/// GeoJSON FeatureCollection of every visible location that has at
/// least one device, annotated with the device count.
pub async fn geojson_locations(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Query(page): Query<PageQuery>,
) -> Result<Json<GeoJsonLocationCollection>, ApiError> {
    require_perm(&operator, ResourceKind::Location, PermAction::View)?;
    let scope = operator_scope(&operator);

    let page_size = page.effective_page_size(GEOJSON_PAGE_SIZE);
    let locations = LocationRepository::new(state.pool.clone());
    let entities = locations
        .geojson_list(scope.org_filter(), page_size.into(), page.offset(page_size))
        .await?;
    let count = locations.geojson_count(scope.org_filter()).await?;

    let features = entities
        .into_iter()
        .map(|entity| {
            let (location, device_count) = entity.into_parts();
            GeoJsonLocationFeature {
                kind: Default::default(),
                id: location.id,
                geometry: location.geometry,
                properties: GeoJsonLocationProperties {
                    organization: location.organization,
                    name: location.name,
                    location_type: location.location_type,
                    is_mobile: location.is_mobile,
                    address: location.address,
                    device_count,
                },
            }
        })
        .collect();

    Ok(Json(GeoJsonLocationCollection {
        kind: Default::default(),
        count,
        features,
    }))
}

/// GET /api/v1/location/{location_id}/device
///
/// Lists the devices placed at a location.
pub async fn devices_at_location(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(location_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<DeviceResponse>>, ApiError> {
    find_visible(&state, &operator, location_id).await?;
    require_perm(&operator, ResourceKind::DeviceLocation, PermAction::View)?;

    let page_size = page.effective_page_size(DEFAULT_PAGE_SIZE);
    let locations = LocationRepository::new(state.pool.clone());
    let devices = locations
        .devices_at(location_id, page_size.into(), page.offset(page_size))
        .await?;
    let count = locations.count_devices_at(location_id).await?;

    let results = devices
        .into_iter()
        .map(|e| DeviceResponse::from(domain::models::Device::from(e)))
        .collect();
    Ok(Json(Paginated::new(count, &page, page_size, results)))
}

/// Visibility scope of an operator.
pub(crate) fn operator_scope(operator: &OperatorIdentity) -> OrgScope {
    scope::resolve(&domain::models::AuthState::Operator(operator.clone()))
}

/// Model-permission gate: 403 when the operator lacks the permission.
pub(crate) fn require_perm(
    operator: &OperatorIdentity,
    resource: ResourceKind,
    action: PermAction,
) -> Result<(), ApiError> {
    if operator.has_perm(resource, action) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Permission denied".to_string()))
    }
}

/// Validates the nested floor plan of a location write against the
/// post-write type and extracts the columns for the repository. A create
/// requires both `floor` and `image`.
fn nested_floorplan<'a>(
    nested: &'a Option<NestedFloorPlan>,
    location_type: LocationType,
) -> Result<Option<NewFloorPlan<'a>>, ApiError> {
    let Some(nested) = nested else {
        return Ok(None);
    };
    ensure_floorplan_allowed(location_type)?;
    let (Some(floor), Some(image)) = (nested.floor, nested.image.as_deref()) else {
        return Err(ApiError::Validation(
            "floor and image are required to create a floor plan".to_string(),
        ));
    };
    Ok(Some(NewFloorPlan { floor, image }))
}

/// Fetches a location, mapping both "does not exist" and "outside the
/// operator's organizations" to 404.
async fn find_visible(
    state: &AppState,
    operator: &OperatorIdentity,
    location_id: Uuid,
) -> Result<LocationEntity, ApiError> {
    let entity = LocationRepository::new(state.pool.clone())
        .find_by_id(location_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;
    if !operator_scope(operator).permits(entity.organization_id) {
        return Err(ApiError::NotFound("Location not found".to_string()));
    }
    Ok(entity)
}
