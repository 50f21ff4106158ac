use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::put,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{CreateCommentDto, Response, UpdateCommentDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

/// Routes addressed by comment id. Ticket-scoped routes live on the
/// tickets router.
pub fn comments_handler() -> Router {
    Router::new().route("/:id", put(update_comment).delete(delete_comment))
}

pub async fn create_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<CreateCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let comment = app_state
        .comment_service
        .create_comment(&user.user, ticket_id, &body.content, body.is_internal)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": comment,
        })),
    ))
}

pub async fn list_comments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let comments = app_state
        .comment_service
        .list_comments(&user.user, ticket_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "comments": comments },
    })))
}

pub async fn update_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(comment_id): Path<Uuid>,
    Json(body): Json<UpdateCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let comment = app_state
        .comment_service
        .update_comment(&user.user, comment_id, &body.content)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": comment,
    })))
}

pub async fn delete_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .comment_service
        .delete_comment(&user.user, comment_id)
        .await?;

    Ok(Json(Response {
        status: "success",
        message: "Comment deleted".to_string(),
    }))
}
