//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{PermissionEntity, UserEntity};
use crate::metrics::QueryTimer;

/// Repository for operator user accounts and their permissions.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        is_superuser: bool,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, password_hash, is_superuser)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(is_superuser)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find user by email address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find user by UUID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all model permissions granted to a user.
    pub async fn permissions_for(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PermissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("permissions_for_user");
        let result = sqlx::query_as::<_, PermissionEntity>(
            r#"
            SELECT * FROM user_permissions WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Grant a model permission to a user.
    pub async fn add_permission(
        &self,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("add_user_permission");
        let result = sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, resource, action)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, resource, action) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(resource)
        .bind(action)
        .execute(&self.pool)
        .await
        .map(|_| ());
        timer.record();
        result
    }
}
