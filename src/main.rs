mod classifier_models;
mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod services;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::DBClient;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    service::{
        analytics_service::AnalyticsService, assignment_engine::AssignmentEngine,
        audit_service::AuditService, comment_service::CommentService,
        notification_service::NotificationService, ticket_service::TicketService,
    },
    services::{priority::PriorityPredictor, sentiment::load_scorer},
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    // Services
    pub ticket_service: Arc<TicketService>,
    pub comment_service: Arc<CommentService>,
    pub notification_service: Arc<NotificationService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub audit_service: Arc<AuditService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);

        let scorer = load_scorer(config.sentiment_model_path.as_deref());
        let priority_predictor = Arc::new(PriorityPredictor::load(
            config.priority_model_path.as_deref(),
        ));
        let engine = AssignmentEngine::new(
            db_client_arc.clone(),
            db_client_arc.clone(),
            config.provider_timeout,
        );

        let notification_service = Arc::new(NotificationService::new(db_client_arc.clone()));
        let audit_service = Arc::new(AuditService::new(db_client_arc.clone()));
        let comment_service = Arc::new(CommentService::new(db_client_arc.clone()));
        let analytics_service = Arc::new(AnalyticsService::new(db_client_arc.clone()));

        let ticket_service = Arc::new(TicketService::new(
            db_client_arc.clone(),
            scorer,
            priority_predictor,
            engine,
            notification_service.clone(),
            audit_service.clone(),
        ));

        Self {
            env: config,
            db_client: db_client_arc,
            ticket_service,
            comment_service,
            notification_service,
            analytics_service,
            audit_service,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            println!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = match config.redis_url {
        Some(ref redis_url) => DBClient::with_redis(pool, redis_url).await,
        None => {
            println!("ℹ️  Redis not configured - Running without cache (set REDIS_URL to enable)");
            DBClient::new(pool)
        }
    };

    let cors = cors_layer(&config.cors_origins);
    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", config.port);
    println!("📊 Cache status: {}", app_state.db_client.cache_status());

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            println!("🔥 Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let config = Config::from_lookup(|name| match name {
            "DATABASE_URL" => Some("postgres://localhost/helpdesk_test".to_string()),
            "JWT_SECRET_KEY" => Some("test-secret".to_string()),
            _ => None,
        })
        .unwrap();

        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();

        Arc::new(AppState::new(DBClient::new(pool), config))
    }

    #[tokio::test]
    async fn health_check_responds_ok() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/tickets", "/api/users/me", "/api/notifications", "/api/analytics/dashboard"] {
            let app = create_router(test_state());

            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/tickets")
                    .header("Authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
