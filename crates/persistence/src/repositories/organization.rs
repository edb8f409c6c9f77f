//! Organization repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::OrganizationEntity;
use crate::metrics::QueryTimer;

/// Repository for organization and membership operations.
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    /// Creates a new OrganizationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new organization.
    pub async fn create(&self, name: &str, slug: &str) -> Result<OrganizationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_organization");
        let result = sqlx::query_as::<_, OrganizationEntity>(
            r#"
            INSERT INTO organizations (name, slug)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find organization by UUID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<OrganizationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_organization_by_id");
        let result = sqlx::query_as::<_, OrganizationEntity>(
            r#"
            SELECT * FROM organizations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Add a user to an organization.
    pub async fn add_member(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        is_admin: bool,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("add_organization_member");
        let result = sqlx::query(
            r#"
            INSERT INTO organization_users (user_id, organization_id, is_admin)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, organization_id) DO UPDATE SET is_admin = $3
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(is_admin)
        .execute(&self.pool)
        .await
        .map(|_| ());
        timer.record();
        result
    }

    /// List the organization ids a user belongs to.
    pub async fn organizations_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("organizations_for_user");
        let rows: Result<Vec<(Uuid,)>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT organization_id FROM organization_users WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        rows.map(|rows| rows.into_iter().map(|(id,)| id).collect())
    }
}
