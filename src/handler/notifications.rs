use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::Response,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::notificationmodel::NotificationQueryParams,
    AppState,
};

pub fn notifications_handler() -> Router {
    Router::new()
        .route("/", get(get_notifications))
        .route("/read-all", put(mark_all_read))
        .route("/:id/read", put(mark_read))
        .route("/:id", delete(delete_notification))
}

pub async fn get_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<NotificationQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    let notifications = app_state
        .notification_service
        .list(user.user.id, params.unread_only.unwrap_or(false))
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "notifications": notifications,
            "results": notifications.len(),
        },
    })))
}

pub async fn mark_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .notification_service
        .mark_read(notification_id, user.user.id)
        .await?;

    Ok(Json(Response {
        status: "success",
        message: "Notification marked as read".to_string(),
    }))
}

pub async fn mark_all_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state
        .notification_service
        .mark_all_read(user.user.id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "updated": updated },
    })))
}

pub async fn delete_notification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .notification_service
        .delete(notification_id, user.user.id)
        .await?;

    Ok(Json(Response {
        status: "success",
        message: "Notification deleted".to_string(),
    }))
}
