// service/notification_service.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{notificationdb::NotificationExt, DBClient},
    models::{
        notificationmodel::{Notification, NotificationType},
        ticketmodel::Ticket,
    },
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn notify_ticket_assigned(
        &self,
        agent_id: Uuid,
        ticket: &Ticket,
    ) -> Result<Notification, ServiceError> {
        tracing::info!(
            "Ticket assignment notification: agent {} assigned to ticket {}",
            agent_id,
            ticket.id
        );

        self.create(
            agent_id,
            "New ticket assigned",
            &format!("You have been assigned ticket: {}", ticket.title),
            NotificationType::Info,
            Some(ticket.id),
        )
        .await
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        notification_type: NotificationType,
        related_ticket_id: Option<Uuid>,
    ) -> Result<Notification, ServiceError> {
        let notification = self
            .db_client
            .create_notification(user_id, title, message, notification_type, related_ticket_id)
            .await?;

        Ok(notification)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, ServiceError> {
        Ok(self
            .db_client
            .get_user_notifications(user_id, unread_only)
            .await?)
    }

    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let updated = self
            .db_client
            .mark_notification_read(notification_id, user_id)
            .await?;

        if !updated {
            return Err(ServiceError::NotificationNotFound(notification_id));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        Ok(self.db_client.mark_all_notifications_read(user_id).await?)
    }

    pub async fn delete(&self, notification_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let deleted = self
            .db_client
            .delete_notification(notification_id, user_id)
            .await?;

        if !deleted {
            return Err(ServiceError::NotificationNotFound(notification_id));
        }
        Ok(())
    }
}
