// Database query timeout protection
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum QueryTimeoutError {
    #[error("Query timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub struct QueryTimeout;

impl QueryTimeout {
    /// Execute a query with a timeout to prevent slow queries from blocking
    pub async fn execute_with_timeout<F, T>(
        query_fn: F,
        timeout_duration: Duration,
    ) -> Result<T, QueryTimeoutError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(timeout_duration, query_fn).await {
            Ok(result) => result.map_err(QueryTimeoutError::from),
            Err(_) => Err(QueryTimeoutError::TimedOut(timeout_duration)),
        }
    }

    /// Longer timeout for complex aggregation queries (30 seconds)
    pub const AGGREGATION_TIMEOUT: Duration = Duration::from_secs(30);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_results() {
        let result = QueryTimeout::execute_with_timeout(
            async { Ok::<_, sqlx::Error>(42) },
            Duration::from_secs(2),
        )
        .await
        .unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn reports_slow_queries() {
        let err = QueryTimeout::execute_with_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, sqlx::Error>(())
            },
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, QueryTimeoutError::TimedOut(_)));
    }

    #[tokio::test]
    async fn keeps_database_errors() {
        let err = QueryTimeout::execute_with_timeout(
            async { Err::<(), _>(sqlx::Error::RowNotFound) },
            QueryTimeout::AGGREGATION_TIMEOUT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, QueryTimeoutError::Database(sqlx::Error::RowNotFound)));
    }
}
