use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use toucan_core::models::User;
use toucan_core::AppError;
use uuid::Uuid;

use super::stores::UserStore;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "insert"))]
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
