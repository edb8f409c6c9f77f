//! Organization domain model.
//!
//! Organizations are the tenant boundary: every location and floor plan
//! belongs to exactly one, and operator visibility is scoped by
//! membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership of an operator in an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgMembership {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub is_admin: bool,
}
