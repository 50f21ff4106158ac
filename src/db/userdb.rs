// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::DBClient;
use crate::models::usermodel::{User, UserRole};

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn save_user<T: Into<String> + Send>(
        &self,
        name: T,
        email: T,
        password: T,
        role: UserRole,
    ) -> Result<User, sqlx::Error>;

    /// Agents ordered by creation time, then id.
    async fn get_agents(&self, active_only: bool) -> Result<Vec<User>, sqlx::Error>;

    async fn set_user_active(
        &self,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<Option<User>, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(
                r#"SELECT id, email, name, password, role, is_active, created_at, updated_at
                FROM users WHERE id = $1"#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(
                r#"SELECT id, email, name, password, role, is_active, created_at, updated_at
                FROM users WHERE email = $1"#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn save_user<T: Into<String> + Send>(
        &self,
        name: T,
        email: T,
        password: T,
        role: UserRole,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, password, role, is_active, created_at, updated_at
            "#,
        )
        .bind(name.into())
        .bind(email.into())
        .bind(password.into())
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_agents(&self, active_only: bool) -> Result<Vec<User>, sqlx::Error> {
        let agents = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password, role, is_active, created_at, updated_at
            FROM users
            WHERE role = $1 AND (is_active OR NOT $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(UserRole::Agent)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(agents)
    }

    async fn set_user_active(
        &self,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, email, name, password, role, is_active, created_at, updated_at
            "#,
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
