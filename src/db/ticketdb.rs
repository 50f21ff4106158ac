// db/ticketdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::DBClient;
use crate::models::ticketmodel::{Ticket, TicketPriority, TicketStatus};

const TICKET_COLUMNS: &str = "id, customer_id, title, description, priority, status, \
    assigned_agent_id, sentiment_score, category, tags, attachment_ids, created_at, updated_at";

/// Fields computed at creation time and stored with the ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub customer_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub sentiment_score: Option<f64>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait TicketExt {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, sqlx::Error>;

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, sqlx::Error>;

    async fn get_customer_tickets(
        &self,
        customer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, sqlx::Error>;

    async fn get_agent_tickets(
        &self,
        agent_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, sqlx::Error>;

    async fn get_all_tickets(&self, limit: i64, offset: i64) -> Result<Vec<Ticket>, sqlx::Error>;

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<Ticket>, sqlx::Error>;

    /// Records the agent and moves the ticket to `in_progress` in one statement.
    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Option<Ticket>, sqlx::Error>;
}

#[async_trait]
impl TicketExt for DBClient {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO tickets (customer_id, title, description, priority, status, sentiment_score, category, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TICKET_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(ticket.customer_id)
            .bind(ticket.title)
            .bind(ticket.description)
            .bind(ticket.priority)
            .bind(TicketStatus::Open)
            .bind(ticket.sentiment_score)
            .bind(ticket.category)
            .bind(ticket.tags)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, sqlx::Error> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1");

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_customer_tickets(
        &self,
        customer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {TICKET_COLUMNS} FROM tickets
            WHERE customer_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(customer_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_agent_tickets(
        &self,
        agent_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {TICKET_COLUMNS} FROM tickets
            WHERE assigned_agent_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(agent_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_all_tickets(&self, limit: i64, offset: i64) -> Result<Vec<Ticket>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {TICKET_COLUMNS} FROM tickets
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE tickets
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {TICKET_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(status)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE tickets
            SET assigned_agent_id = $1, status = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {TICKET_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(agent_id)
            .bind(TicketStatus::InProgress)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
    }
}
