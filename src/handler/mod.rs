pub mod analytics;
pub mod auth;
pub mod comments;
pub mod notifications;
pub mod tickets;
pub mod users;

use axum::http::{header, HeaderMap};

use crate::models::auditmodel::RequestContext;

/// Client address and agent for audit entries. Prefers the first
/// `X-Forwarded-For` hop.
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string())
    };

    let ip_address = header_value("x-forwarded-for")
        .and_then(|value| value.split(',').next().map(|hop| hop.trim().to_string()))
        .filter(|hop| !hop.is_empty())
        .or_else(|| header_value("x-real-ip"));

    RequestContext {
        ip_address,
        user_agent: header_value(header::USER_AGENT.as_str()),
    }
}
