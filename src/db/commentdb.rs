// db/commentdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::DBClient;
use crate::models::commentmodel::Comment;

#[async_trait]
pub trait CommentExt {
    async fn create_comment(
        &self,
        ticket_id: Uuid,
        author_id: Uuid,
        content: &str,
        is_internal: bool,
    ) -> Result<Comment, sqlx::Error>;

    /// Oldest first. Internal comments are dropped unless `include_internal`.
    async fn get_ticket_comments(
        &self,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<Comment>, sqlx::Error>;

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error>;

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>, sqlx::Error>;

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl CommentExt for DBClient {
    async fn create_comment(
        &self,
        ticket_id: Uuid,
        author_id: Uuid,
        content: &str,
        is_internal: bool,
    ) -> Result<Comment, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (ticket_id, author_id, content, is_internal)
            VALUES ($1, $2, $3, $4)
            RETURNING id, ticket_id, author_id, content, is_internal, created_at, updated_at
            "#,
        )
        .bind(ticket_id)
        .bind(author_id)
        .bind(content)
        .bind(is_internal)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_ticket_comments(
        &self,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, ticket_id, author_id, content, is_internal, created_at, updated_at
            FROM comments
            WHERE ticket_id = $1 AND (NOT is_internal OR $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(ticket_id)
        .bind(include_internal)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, ticket_id, author_id, content, is_internal, created_at, updated_at
            FROM comments WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, ticket_id, author_id, content, is_internal, created_at, updated_at
            "#,
        )
        .bind(content)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
