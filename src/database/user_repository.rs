use crate::database::error::DatabaseError;
use sqlx::{FromRow, PgPool};

/// Rider account keyed by the auth provider's user id
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub clerk_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        clerk_id: &str,
    ) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, clerk_id) \
             VALUES ($1, $2, $3) \
             RETURNING id, name, email, clerk_id, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(clerk_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, clerk_id, created_at FROM users WHERE clerk_id = $1",
        )
        .bind(clerk_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
