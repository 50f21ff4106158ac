use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregated metrics for one agent. Maintained by reporting jobs outside
/// this service; read here for assignment and analytics.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentPerformance {
    pub agent_id: Uuid,
    pub tickets_resolved: i32,
    pub average_response_time: f64,
    pub average_resolution_time: f64,
    pub customer_satisfaction_score: f64,
    pub total_assigned_tickets: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentPerformanceWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub performance: AgentPerformance,
    pub agent_name: String,
    pub agent_email: String,
}
