use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::CapacityQueryDto,
    error::HttpError,
    middleware::role_check,
    models::{analyticsmodel::ResponseTimeQueryParams, usermodel::UserRole},
    AppState,
};

pub fn analytics_handler() -> Router {
    Router::new()
        .route(
            "/dashboard",
            get(get_dashboard).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Agent, UserRole::Admin])
            })),
        )
        .route(
            "/response-times",
            get(get_response_times).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Agent, UserRole::Admin])
            })),
        )
        .route(
            "/agents",
            get(get_all_agents_performance).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin])
            })),
        )
        .route("/agents/:id", get(get_agent_performance))
        .route(
            "/agents/:id/capacity",
            get(get_agent_capacity).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Agent, UserRole::Admin])
            })),
        )
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.analytics_service.get_dashboard_stats().await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": stats,
    })))
}

pub async fn get_response_times(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<ResponseTimeQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    let metrics = app_state
        .analytics_service
        .get_response_time_metrics(params.days)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": metrics,
    })))
}

pub async fn get_all_agents_performance(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let agents = app_state.analytics_service.get_all_agents_performance().await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "agents": agents },
    })))
}

pub async fn get_agent_performance(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(agent_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let performance = app_state
        .analytics_service
        .get_agent_performance(agent_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": performance,
    })))
}

pub async fn get_agent_capacity(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(agent_id): Path<Uuid>,
    Query(params): Query<CapacityQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let priority = params.priority.unwrap_or_default();
    let can_handle = app_state
        .ticket_service
        .agent_can_handle(agent_id, priority)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "agent_id": agent_id,
            "priority": priority,
            "can_handle": can_handle,
        },
    })))
}
