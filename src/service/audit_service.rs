// service/audit_service.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{auditdb::AuditExt, DBClient},
    models::{
        auditmodel::{AuditLog, RequestContext},
        ticketmodel::{Ticket, TicketStatus},
    },
    service::error::ServiceError,
};

const TICKET_ENTITY: &str = "ticket";

#[derive(Debug, Clone)]
pub struct AuditService {
    db_client: Arc<DBClient>,
}

impl AuditService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn log_ticket_creation(
        &self,
        user_id: Uuid,
        ticket: &Ticket,
        context: &RequestContext,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            user_id,
            "ticket_created",
            ticket.id,
            serde_json::json!({
                "title": ticket.title,
                "priority": ticket.priority.to_str(),
                "sentiment_score": ticket.sentiment_score,
            }),
            context,
        )
        .await
    }

    pub async fn log_status_change(
        &self,
        user_id: Uuid,
        ticket: &Ticket,
        previous: TicketStatus,
        context: &RequestContext,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            user_id,
            "ticket_status_changed",
            ticket.id,
            serde_json::json!({
                "from": previous.to_str(),
                "to": ticket.status.to_str(),
            }),
            context,
        )
        .await
    }

    pub async fn log_assignment(
        &self,
        user_id: Uuid,
        ticket: &Ticket,
        agent_id: Uuid,
        automatic: bool,
        context: &RequestContext,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            user_id,
            "ticket_assigned",
            ticket.id,
            serde_json::json!({
                "agent_id": agent_id,
                "automatic": automatic,
            }),
            context,
        )
        .await
    }

    pub async fn get_ticket_history(
        &self,
        ticket_id: Uuid,
        limit: i64,
    ) -> Result<Vec<AuditLog>, ServiceError> {
        Ok(self.db_client.get_audit_logs(Some(ticket_id), limit).await?)
    }

    async fn log_audit_event(
        &self,
        user_id: Uuid,
        action: &str,
        entity_id: Uuid,
        changes: serde_json::Value,
        context: &RequestContext,
    ) -> Result<(), ServiceError> {
        self.db_client
            .create_audit_log(user_id, action, TICKET_ENTITY, entity_id, changes, context)
            .await?;

        tracing::debug!("Audit: {} on {} {} by {}", action, TICKET_ENTITY, entity_id, user_id);
        Ok(())
    }
}
