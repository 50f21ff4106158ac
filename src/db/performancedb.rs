// db/performancedb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::DBClient;
use crate::models::performancemodel::{AgentPerformance, AgentPerformanceWithUser};

#[async_trait]
pub trait PerformanceExt {
    async fn get_agent_performance(
        &self,
        agent_id: Uuid,
    ) -> Result<Option<AgentPerformance>, sqlx::Error>;

    async fn get_all_agents_performance(
        &self,
    ) -> Result<Vec<AgentPerformanceWithUser>, sqlx::Error>;
}

#[async_trait]
impl PerformanceExt for DBClient {
    async fn get_agent_performance(
        &self,
        agent_id: Uuid,
    ) -> Result<Option<AgentPerformance>, sqlx::Error> {
        sqlx::query_as::<_, AgentPerformance>(
            r#"
            SELECT agent_id, tickets_resolved, average_response_time, average_resolution_time,
                   customer_satisfaction_score, total_assigned_tickets, created_at, updated_at
            FROM agent_performance
            WHERE agent_id = $1
            "#,
        )
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_all_agents_performance(
        &self,
    ) -> Result<Vec<AgentPerformanceWithUser>, sqlx::Error> {
        sqlx::query_as::<_, AgentPerformanceWithUser>(
            r#"
            SELECT p.agent_id, p.tickets_resolved, p.average_response_time, p.average_resolution_time,
                   p.customer_satisfaction_score, p.total_assigned_tickets, p.created_at, p.updated_at,
                   u.name AS agent_name, u.email AS agent_email
            FROM agent_performance p
            JOIN users u ON u.id = p.agent_id
            ORDER BY u.created_at ASC, u.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
