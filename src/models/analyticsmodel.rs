use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketStatistics {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub in_progress_tickets: i64,
    pub resolved_tickets: i64,
    pub closed_tickets: i64,
    pub high_priority: i64,
    pub urgent_tickets: i64,
}

/// Buckets: positive above 0.5, neutral within [0.3, 0.5], negative below 0.3.
/// Tickets without a score are not counted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct SentimentDistribution {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResponseTimeMetrics {
    pub average_response_time_hours: f64,
    pub total_tickets_period: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub tickets: TicketStatistics,
    pub sentiment: SentimentDistribution,
    pub categories: BTreeMap<String, i64>,
    pub response_metrics: ResponseTimeMetrics,
}

#[derive(Debug, Deserialize)]
pub struct ResponseTimeQueryParams {
    pub days: Option<i32>,
}
