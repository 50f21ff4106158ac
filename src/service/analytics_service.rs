// service/analytics_service.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{
        analyticsdb::AnalyticsExt,
        cache::{CacheHelper, DASHBOARD_CACHE_KEY, DASHBOARD_CACHE_TTL},
        performancedb::PerformanceExt,
        DBClient,
    },
    models::{
        analyticsmodel::{DashboardStats, ResponseTimeMetrics},
        performancemodel::{AgentPerformance, AgentPerformanceWithUser},
    },
    service::error::ServiceError,
};

pub const DEFAULT_RESPONSE_WINDOW_DAYS: i32 = 30;

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    db_client: Arc<DBClient>,
}

impl AnalyticsService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    /// Dashboard figures, served from Redis for a minute when it is configured.
    pub async fn get_dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        if let Some(redis) = &self.db_client.redis_client {
            match CacheHelper::get::<DashboardStats>(redis, DASHBOARD_CACHE_KEY).await {
                Ok(Some(stats)) => return Ok(stats),
                Ok(None) => {}
                Err(e) => tracing::warn!("Dashboard cache read failed: {}", e),
            }
        }

        let (tickets, sentiment, categories, response_metrics) = tokio::try_join!(
            self.db_client.get_ticket_statistics(),
            self.db_client.get_sentiment_distribution(),
            self.db_client.get_category_distribution(),
            self.db_client.get_response_time_metrics(DEFAULT_RESPONSE_WINDOW_DAYS),
        )?;

        let stats = DashboardStats {
            tickets,
            sentiment,
            categories,
            response_metrics,
        };

        if let Some(redis) = &self.db_client.redis_client {
            if let Err(e) =
                CacheHelper::set(redis, DASHBOARD_CACHE_KEY, &stats, DASHBOARD_CACHE_TTL).await
            {
                tracing::warn!("Dashboard cache write failed: {}", e);
            }
        }

        Ok(stats)
    }

    pub async fn get_response_time_metrics(
        &self,
        days: Option<i32>,
    ) -> Result<ResponseTimeMetrics, ServiceError> {
        let days = days.unwrap_or(DEFAULT_RESPONSE_WINDOW_DAYS);
        if days <= 0 {
            return Err(ServiceError::Validation("days must be positive".to_string()));
        }

        Ok(self.db_client.get_response_time_metrics(days).await?)
    }

    pub async fn get_agent_performance(
        &self,
        agent_id: Uuid,
    ) -> Result<AgentPerformance, ServiceError> {
        self.db_client
            .get_agent_performance(agent_id)
            .await?
            .ok_or(ServiceError::PerformanceNotFound(agent_id))
    }

    pub async fn get_all_agents_performance(
        &self,
    ) -> Result<Vec<AgentPerformanceWithUser>, ServiceError> {
        Ok(self.db_client.get_all_agents_performance().await?)
    }
}
