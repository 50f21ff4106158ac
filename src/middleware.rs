use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    db::{cache::CacheHelper, userdb::UserExt},
    error::{ErrorMessage, HttpError},
    models::usermodel::{User, UserRole},
    utils::token,
    AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
    /// Raw bearer token, kept so logout can revoke it.
    pub token: String,
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.to_owned())
        })
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let claims = token::decode_token(token.as_str(), app_state.env.jwt_secret.as_bytes())
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    if let Some(redis_client) = &app_state.db_client.redis_client {
        let revoked = CacheHelper::exists(redis_client, &token::blacklist_key(&token))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Token blacklist lookup failed: {}", e);
                false
            });

        if revoked {
            return Err(HttpError::unauthorized(ErrorMessage::TokenRevoked.to_string()));
        }
    }

    let user_id = uuid::Uuid::parse_str(&claims.sub)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|_| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    if !user.is_active {
        return Err(HttpError::forbidden(ErrorMessage::UserInactive.to_string()));
    }

    req.extensions_mut().insert(JWTAuthMiddeware { user, token });

    Ok(next.run(req).await)
}

pub async fn role_check(
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let user = req
        .extensions()
        .get::<JWTAuthMiddeware>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if !is_authorized(user.user.role, &required_roles) {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(next.run(req).await)
}

/// True when `role` is one of `required`. An empty list admits nobody.
pub fn is_authorized(role: UserRole, required: &[UserRole]) -> bool {
    required.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_truth_table() {
        let staff = [UserRole::Agent, UserRole::Admin];

        assert!(is_authorized(UserRole::Admin, &staff));
        assert!(is_authorized(UserRole::Agent, &staff));
        assert!(!is_authorized(UserRole::Customer, &staff));

        assert!(is_authorized(UserRole::Admin, &[UserRole::Admin]));
        assert!(!is_authorized(UserRole::Agent, &[UserRole::Admin]));

        assert!(!is_authorized(UserRole::Admin, &[]));
    }
}
