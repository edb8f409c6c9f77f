//! Location-type / floor-plan consistency rules.
//!
//! These rules fire on every location or association write that could
//! change a location's type or floor-plan linkage:
//!
//! 1. A floor plan may only reference an indoor location, checked against
//!    the state the location will have after the current write.
//! 2. Changing a location's type to outdoor destroys its floor-plan data:
//!    the caller must cascade (delete anchored floor plans, clear
//!    `floorplan`/`indoor` on referencing associations) in the same
//!    transaction as the type change.
//! 3. Attaching a floor plan to an outdoor location fails validation
//!    before any write occurs.

use thiserror::Error;
use uuid::Uuid;

use crate::models::LocationType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("floor plans can only be associated to indoor locations")]
    FloorPlanOnOutdoor,

    #[error("the floor plan does not belong to this location")]
    FloorPlanLocationMismatch,

    #[error("an indoor position can only be set on indoor locations")]
    IndoorPositionOnOutdoor,
}

/// How a write changes a location's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTransition {
    Unchanged,
    /// Destructive: floor plans must be cascaded away.
    ToOutdoor,
    ToIndoor,
}

/// Classifies the type change requested by a (possibly partial) write.
pub fn classify_transition(
    current: LocationType,
    requested: Option<LocationType>,
) -> TypeTransition {
    match requested {
        None => TypeTransition::Unchanged,
        Some(next) if next == current => TypeTransition::Unchanged,
        Some(LocationType::Outdoor) => TypeTransition::ToOutdoor,
        Some(LocationType::Indoor) => TypeTransition::ToIndoor,
    }
}

/// Pre-check for rule 3: rejects a floor-plan write against a location
/// whose (post-write) type is not indoor.
pub fn ensure_floorplan_allowed(location_type: LocationType) -> Result<(), ConsistencyError> {
    match location_type {
        LocationType::Indoor => Ok(()),
        LocationType::Outdoor => Err(ConsistencyError::FloorPlanOnOutdoor),
    }
}

/// Rejects a non-empty indoor position against a location whose
/// (post-write) type is outdoor. The empty string is tolerated because
/// provisioning records it as the "no pin yet" placeholder.
pub fn ensure_indoor_position_allowed(
    location_type: LocationType,
    indoor: &str,
) -> Result<(), ConsistencyError> {
    if indoor.is_empty() || location_type == LocationType::Indoor {
        Ok(())
    } else {
        Err(ConsistencyError::IndoorPositionOnOutdoor)
    }
}

/// Invariant: an association's floor plan must be anchored to the
/// association's own location.
pub fn ensure_floorplan_belongs(
    floorplan_location: Uuid,
    association_location: Uuid,
) -> Result<(), ConsistencyError> {
    if floorplan_location == association_location {
        Ok(())
    } else {
        Err(ConsistencyError::FloorPlanLocationMismatch)
    }
}

/// Context for validating a nested floor-plan write on the device
/// endpoint, passed explicitly instead of shared serializer state.
#[derive(Debug, Clone, Copy)]
pub struct NestedWriteContext {
    /// The association's location after the current write is applied.
    pub location_id: Uuid,
    pub location_type: LocationType,
}

/// Validates a nested floor-plan create-or-update against the write
/// context. `existing_floorplan_location` is the anchor of the floor
/// plan being updated, if one already exists.
pub fn validate_floorplan_write(
    ctx: &NestedWriteContext,
    existing_floorplan_location: Option<Uuid>,
) -> Result<(), ConsistencyError> {
    ensure_floorplan_allowed(ctx.location_type)?;
    if let Some(anchor) = existing_floorplan_location {
        ensure_floorplan_belongs(anchor, ctx.location_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_no_request() {
        assert_eq!(
            classify_transition(LocationType::Indoor, None),
            TypeTransition::Unchanged
        );
    }

    #[test]
    fn test_classify_same_type() {
        assert_eq!(
            classify_transition(LocationType::Outdoor, Some(LocationType::Outdoor)),
            TypeTransition::Unchanged
        );
        assert_eq!(
            classify_transition(LocationType::Indoor, Some(LocationType::Indoor)),
            TypeTransition::Unchanged
        );
    }

    #[test]
    fn test_classify_indoor_to_outdoor() {
        assert_eq!(
            classify_transition(LocationType::Indoor, Some(LocationType::Outdoor)),
            TypeTransition::ToOutdoor
        );
    }

    #[test]
    fn test_classify_outdoor_to_indoor() {
        assert_eq!(
            classify_transition(LocationType::Outdoor, Some(LocationType::Indoor)),
            TypeTransition::ToIndoor
        );
    }

    #[test]
    fn test_floorplan_on_outdoor_rejected() {
        let err = ensure_floorplan_allowed(LocationType::Outdoor).unwrap_err();
        assert_eq!(err, ConsistencyError::FloorPlanOnOutdoor);
        // The message must point the user at the indoor requirement.
        assert!(err.to_string().contains("indoor"));
    }

    #[test]
    fn test_floorplan_on_indoor_allowed() {
        assert!(ensure_floorplan_allowed(LocationType::Indoor).is_ok());
    }

    #[test]
    fn test_indoor_position_on_outdoor_rejected() {
        let err =
            ensure_indoor_position_allowed(LocationType::Outdoor, "5,5").unwrap_err();
        assert_eq!(err, ConsistencyError::IndoorPositionOnOutdoor);
        assert!(err.to_string().contains("indoor"));
    }

    #[test]
    fn test_indoor_position_allowed_cases() {
        assert!(ensure_indoor_position_allowed(LocationType::Indoor, "5,5").is_ok());
        // The provisioning placeholder is valid regardless of type.
        assert!(ensure_indoor_position_allowed(LocationType::Outdoor, "").is_ok());
    }

    #[test]
    fn test_floorplan_must_belong_to_location() {
        let loc = Uuid::new_v4();
        assert!(ensure_floorplan_belongs(loc, loc).is_ok());
        assert_eq!(
            ensure_floorplan_belongs(loc, Uuid::new_v4()).unwrap_err(),
            ConsistencyError::FloorPlanLocationMismatch
        );
    }

    #[test]
    fn test_validate_floorplan_write_full() {
        let loc = Uuid::new_v4();
        let ctx = NestedWriteContext {
            location_id: loc,
            location_type: LocationType::Indoor,
        };
        assert!(validate_floorplan_write(&ctx, None).is_ok());
        assert!(validate_floorplan_write(&ctx, Some(loc)).is_ok());
        assert!(validate_floorplan_write(&ctx, Some(Uuid::new_v4())).is_err());

        let outdoor_ctx = NestedWriteContext {
            location_id: loc,
            location_type: LocationType::Outdoor,
        };
        assert_eq!(
            validate_floorplan_write(&outdoor_ctx, None).unwrap_err(),
            ConsistencyError::FloorPlanOnOutdoor
        );
    }
}
