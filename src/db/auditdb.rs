// db/auditdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::DBClient;
use crate::models::auditmodel::{AuditLog, RequestContext};

#[async_trait]
pub trait AuditExt {
    async fn create_audit_log(
        &self,
        user_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        changes: serde_json::Value,
        context: &RequestContext,
    ) -> Result<AuditLog, sqlx::Error>;

    async fn get_audit_logs(
        &self,
        entity_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error>;
}

#[async_trait]
impl AuditExt for DBClient {
    async fn create_audit_log(
        &self,
        user_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        changes: serde_json::Value,
        context: &RequestContext,
    ) -> Result<AuditLog, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id, changes, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, action, entity_type, entity_id, changes, ip_address, user_agent, created_at
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(changes)
        .bind(context.ip_address.as_deref())
        .bind(context.user_agent.as_deref())
        .fetch_one(&self.pool)
        .await
    }

    async fn get_audit_logs(
        &self,
        entity_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, action, entity_type, entity_id, changes, ip_address, user_agent, created_at
            FROM audit_logs
            WHERE ($1::UUID IS NULL OR entity_id = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(entity_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
