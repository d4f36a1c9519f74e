//! PostgreSQL 자격증명 저장소.
//!
//! 스키마는 `migrations/`에 있습니다.
//!
//! - `roles(id, name UNIQUE)`
//! - `users(id, username UNIQUE, password_hash, created_at)`
//! - `user_roles(user_id, role_id, position)`: `position`으로 할당 순서 유지

use async_trait::async_trait;
use review_core::{Identity, NewIdentity, RoleName};
use sqlx::{FromRow, PgPool};
use tracing::info;

use super::credentials::{CredentialStore, InsertOutcome, StoreError};

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
}

/// PostgreSQL 저장소.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 스키마 마이그레이션 실행.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running credential store migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        let Some(user) = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY ur.position
            "#,
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        let roles = names
            .into_iter()
            .map(|name| {
                RoleName::new(name)
                    .map_err(|e| StoreError::Corrupt(format!("user {}: {}", user.username, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Identity {
            username: user.username,
            password_hash: user.password_hash,
            roles,
        }))
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn ensure_role(&self, role: &RoleName) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_if_absent(&self, identity: NewIdentity) -> Result<InsertOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(InsertOutcome::AlreadyExists);
        };

        for (position, role) in identity.roles.iter().enumerate() {
            let result = sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id, position)
                SELECT $1, id, $3 FROM roles WHERE name = $2
                ON CONFLICT (user_id, role_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(role.as_str())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let known: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE name = $1)")
                        .bind(role.as_str())
                        .fetch_one(&mut *tx)
                        .await?;
                if !known {
                    return Err(StoreError::UnknownRole(role.clone()));
                }
            }
        }

        tx.commit().await?;
        Ok(InsertOutcome::Inserted)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
