// db.rs
pub mod analyticsdb;
pub mod auditdb;
pub mod cache;
pub mod commentdb;
pub mod notificationdb;
pub mod performancedb;
pub mod query_timeout;
pub mod ticketdb;
pub mod userdb;

use sqlx::{Pool, Postgres};
use redis::aio::ConnectionManager;
use std::sync::Arc;

/// Handle to the datastore. Built once in `main` and handed to every service;
/// tests build their own with a lazy pool.
#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
    pub redis_client: Option<Arc<ConnectionManager>>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .field("redis_client", &self.redis_client.is_some())
            .finish()
    }
}

impl DBClient {
    /// Create a new DBClient with PostgreSQL pool only
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient {
            pool,
            redis_client: None,
        }
    }

    /// Create a new DBClient with both PostgreSQL and Redis. A Redis failure
    /// is logged and the client runs without cache.
    pub async fn with_redis(pool: Pool<Postgres>, redis_url: &str) -> Self {
        let client = match redis::Client::open(redis_url) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("⚠️ Failed to create Redis client: {}. Continuing without cache.", e);
                return DBClient::new(pool);
            }
        };

        match ConnectionManager::new(client).await {
            Ok(conn) => {
                tracing::info!("✅ Redis connection established successfully");
                DBClient {
                    pool,
                    redis_client: Some(Arc::new(conn)),
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to connect to Redis: {}. Continuing without cache.", e);
                DBClient::new(pool)
            }
        }
    }

    /// Get cache status for monitoring
    pub fn cache_status(&self) -> &str {
        if self.redis_client.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    }
}
