use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{AssignTicketDto, CreateTicketDto, UpdateTicketStatusDto},
    error::HttpError,
    handler::{comments, request_context},
    middleware::{role_check, JWTAuthMiddeware},
    models::{auditmodel::AuditQueryParams, ticketmodel::TicketQueryParams, usermodel::UserRole},
    service::ticket_service::CreateTicketInput,
    AppState,
};

pub fn tickets_handler() -> Router {
    Router::new()
        .route("/", post(create_ticket).get(list_tickets))
        .route("/:id", get(get_ticket))
        .route(
            "/:id/status",
            put(update_ticket_status).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Agent, UserRole::Admin])
            })),
        )
        .route(
            "/:id/assign",
            post(assign_ticket).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Agent, UserRole::Admin])
            })),
        )
        .route(
            "/:id/history",
            get(get_ticket_history).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Agent, UserRole::Admin])
            })),
        )
        .route(
            "/:id/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    headers: HeaderMap,
    Json(body): Json<CreateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let created = app_state
        .ticket_service
        .create_ticket(
            &user.user,
            CreateTicketInput {
                title: body.title.trim().to_string(),
                description: body.description.trim().to_string(),
                priority: body.priority,
                category: body.category,
            },
            &request_context(&headers),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": "Ticket created successfully",
            "data": created,
        })),
    ))
}

pub async fn list_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<TicketQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    let tickets = app_state
        .ticket_service
        .list_tickets(&user.user, params.limit, params.offset)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "tickets": tickets,
            "results": tickets.len(),
        },
    })))
}

pub async fn get_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .get_ticket(&user.user, ticket_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket,
    })))
}

pub async fn update_ticket_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<UpdateTicketStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = app_state
        .ticket_service
        .update_status(&user.user, ticket_id, body.status, &request_context(&headers))
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Status updated",
        "data": ticket,
    })))
}

/// Body is optional: `{ "agent_id": ... }` assigns manually, nothing or `{}`
/// lets the engine choose.
pub async fn assign_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let body = parse_assign_body(&body)?;

    let ticket = app_state
        .ticket_service
        .assign_ticket(&user.user, ticket_id, body.agent_id, &request_context(&headers))
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Ticket assigned",
        "data": ticket,
    })))
}

pub async fn get_ticket_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    Query(params): Query<AuditQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.ticket_service.get_ticket(&user.user, ticket_id).await?;

    let entries = app_state
        .audit_service
        .get_ticket_history(ticket_id, params.limit.unwrap_or(50).clamp(1, 200))
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "history": entries },
    })))
}

fn parse_assign_body(body: &[u8]) -> Result<AssignTicketDto, HttpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AssignTicketDto::default());
    }

    serde_json::from_slice(body).map_err(|e| HttpError::bad_request(e.to_string()))
}
