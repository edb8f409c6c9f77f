//! Operator floor plan endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    CreateFloorPlanRequest, FloorPlanResponse, LocationType, OperatorIdentity, PermAction,
    ResourceKind, UpdateFloorPlanRequest,
};
use domain::services::consistency::ensure_floorplan_allowed;
use persistence::entities::{FloorPlanEntity, LocationEntity};
use persistence::repositories::{FloorPlanRepository, LocationRepository};
use shared::pagination::{PageQuery, Paginated, DEFAULT_PAGE_SIZE};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OperatorAuth;
use crate::routes::locations::{operator_scope, require_perm};

/// GET /api/v1/floorplan
pub async fn list_floorplans(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<FloorPlanResponse>>, ApiError> {
    require_perm(&operator, ResourceKind::FloorPlan, PermAction::View)?;
    let scope = operator_scope(&operator);

    let page_size = page.effective_page_size(DEFAULT_PAGE_SIZE);
    let floorplans = FloorPlanRepository::new(state.pool.clone());
    let entities = floorplans
        .list(scope.org_filter(), page_size.into(), page.offset(page_size))
        .await?;
    let count = floorplans.count(scope.org_filter()).await?;

    let results = entities
        .into_iter()
        .map(|e| FloorPlanResponse::from(domain::models::FloorPlan::from(e)))
        .collect();
    Ok(Json(Paginated::new(count, &page, page_size, results)))
}

/// POST /api/v1/floorplan
pub async fn create_floorplan(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Json(request): Json<CreateFloorPlanRequest>,
) -> Result<(StatusCode, Json<FloorPlanResponse>), ApiError> {
    request.validate()?;
    require_perm(&operator, ResourceKind::FloorPlan, PermAction::Add)?;

    let location = find_anchor(&state, &operator, request.location).await?;
    let location_type =
        LocationType::parse(&location.location_type).unwrap_or(LocationType::Outdoor);
    ensure_floorplan_allowed(location_type)?;

    let created = FloorPlanRepository::new(state.pool.clone())
        .create(
            location.id,
            location.organization_id,
            request.floor,
            &request.image,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FloorPlanResponse::from(domain::models::FloorPlan::from(
            created,
        ))),
    ))
}

/// GET /api/v1/floorplan/{floorplan_id}
pub async fn get_floorplan(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(floorplan_id): Path<Uuid>,
) -> Result<Json<FloorPlanResponse>, ApiError> {
    let entity = find_visible(&state, &operator, floorplan_id).await?;
    require_perm(&operator, ResourceKind::FloorPlan, PermAction::View)?;
    Ok(Json(FloorPlanResponse::from(
        domain::models::FloorPlan::from(entity),
    )))
}

/// PATCH /api/v1/floorplan/{floorplan_id}
///
/// Moving the floor plan to another location requires the target to be
/// indoor and visible; the organization follows the new anchor.
pub async fn update_floorplan(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(floorplan_id): Path<Uuid>,
    Json(request): Json<UpdateFloorPlanRequest>,
) -> Result<Json<FloorPlanResponse>, ApiError> {
    request.validate()?;
    let entity = find_visible(&state, &operator, floorplan_id).await?;
    require_perm(&operator, ResourceKind::FloorPlan, PermAction::Change)?;

    let floorplans = FloorPlanRepository::new(state.pool.clone());

    if let Some(target_id) = request.location {
        if target_id != entity.location_id {
            let target = find_anchor(&state, &operator, target_id).await?;
            let target_type =
                LocationType::parse(&target.location_type).unwrap_or(LocationType::Outdoor);
            ensure_floorplan_allowed(target_type)?;
            floorplans
                .relocate(floorplan_id, target.id, target.organization_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Floor plan not found".to_string()))?;
        }
    }

    let updated = floorplans
        .update(floorplan_id, request.floor, request.image.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Floor plan not found".to_string()))?;

    Ok(Json(FloorPlanResponse::from(
        domain::models::FloorPlan::from(updated),
    )))
}

/// DELETE /api/v1/floorplan/{floorplan_id}
pub async fn delete_floorplan(
    State(state): State<AppState>,
    OperatorAuth(operator): OperatorAuth,
    Path(floorplan_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    find_visible(&state, &operator, floorplan_id).await?;
    require_perm(&operator, ResourceKind::FloorPlan, PermAction::Delete)?;

    FloorPlanRepository::new(state.pool.clone())
        .delete(floorplan_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetches a floor plan, mapping unknown ids and foreign-tenant plans
/// to 404.
async fn find_visible(
    state: &AppState,
    operator: &OperatorIdentity,
    floorplan_id: Uuid,
) -> Result<FloorPlanEntity, ApiError> {
    let entity = FloorPlanRepository::new(state.pool.clone())
        .find_by_id(floorplan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Floor plan not found".to_string()))?;
    if !operator_scope(operator).permits(entity.organization_id) {
        return Err(ApiError::NotFound("Floor plan not found".to_string()));
    }
    Ok(entity)
}

/// Fetches the location a floor plan is being anchored to.
async fn find_anchor(
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
