// db/analyticsdb.rs
use std::collections::BTreeMap;

use async_trait::async_trait;

use super::DBClient;
use super::query_timeout::{QueryTimeout, QueryTimeoutError};
use crate::models::analyticsmodel::{ResponseTimeMetrics, SentimentDistribution, TicketStatistics};

pub const UNCATEGORIZED: &str = "uncategorized";

#[async_trait]
pub trait AnalyticsExt {
    async fn get_ticket_statistics(&self) -> Result<TicketStatistics, QueryTimeoutError>;

    async fn get_sentiment_distribution(&self)
        -> Result<SentimentDistribution, QueryTimeoutError>;

    async fn get_category_distribution(&self)
        -> Result<BTreeMap<String, i64>, QueryTimeoutError>;

    /// Mean delay between ticket creation and the first comment by someone
    /// other than the requester, over tickets created in the last `days`.
    async fn get_response_time_metrics(
        &self,
        days: i32,
    ) -> Result<ResponseTimeMetrics, QueryTimeoutError>;
}

#[async_trait]
impl AnalyticsExt for DBClient {
    async fn get_ticket_statistics(&self) -> Result<TicketStatistics, QueryTimeoutError> {
        QueryTimeout::execute_with_timeout(
            sqlx::query_as::<_, TicketStatistics>(
                r#"
                SELECT
                    COUNT(*) AS total_tickets,
                    COUNT(*) FILTER (WHERE status = 'open') AS open_tickets,
                    COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress_tickets,
                    COUNT(*) FILTER (WHERE status = 'resolved') AS resolved_tickets,
                    COUNT(*) FILTER (WHERE status = 'closed') AS closed_tickets,
                    COUNT(*) FILTER (WHERE priority = 'high') AS high_priority,
                    COUNT(*) FILTER (WHERE priority = 'urgent') AS urgent_tickets
                FROM tickets
                "#,
            )
            .fetch_one(&self.pool),
            QueryTimeout::AGGREGATION_TIMEOUT,
        )
        .await
    }

    async fn get_sentiment_distribution(
        &self,
    ) -> Result<SentimentDistribution, QueryTimeoutError> {
        QueryTimeout::execute_with_timeout(
            sqlx::query_as::<_, SentimentDistribution>(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE sentiment_score > 0.5) AS positive,
                    COUNT(*) FILTER (WHERE sentiment_score BETWEEN 0.3 AND 0.5) AS neutral,
                    COUNT(*) FILTER (WHERE sentiment_score < 0.3) AS negative
                FROM tickets
                "#,
            )
            .fetch_one(&self.pool),
            QueryTimeout::AGGREGATION_TIMEOUT,
        )
        .await
    }

    async fn get_category_distribution(
        &self,
    ) -> Result<BTreeMap<String, i64>, QueryTimeoutError> {
        let rows: Vec<(String, i64)> = QueryTimeout::execute_with_timeout(
            sqlx::query_as::<_, (String, i64)>(
                r#"
                SELECT COALESCE(category, $1) AS category, COUNT(*) AS count
                FROM tickets
                GROUP BY 1
                "#,
            )
            .bind(UNCATEGORIZED)
            .fetch_all(&self.pool),
            QueryTimeout::AGGREGATION_TIMEOUT,
        )
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn get_response_time_metrics(
        &self,
        days: i32,
    ) -> Result<ResponseTimeMetrics, QueryTimeoutError> {
        QueryTimeout::execute_with_timeout(
            sqlx::query_as::<_, ResponseTimeMetrics>(
                r#"
                SELECT
                    (COALESCE(AVG(EXTRACT(EPOCH FROM (fr.first_reply - t.created_at))), 0) / 3600.0)::FLOAT8
                        AS average_response_time_hours,
                    COUNT(*) AS total_tickets_period
                FROM tickets t
                LEFT JOIN LATERAL (
                    SELECT MIN(c.created_at) AS first_reply
                    FROM comments c
                    WHERE c.ticket_id = t.id AND c.author_id <> t.customer_id
                ) fr ON TRUE
                WHERE t.created_at >= NOW() - make_interval(days => $1)
                "#,
            )
            .bind(days)
            .fetch_one(&self.pool),
            QueryTimeout::AGGREGATION_TIMEOUT,
        )
        .await
    }
}
