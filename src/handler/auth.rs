use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::{cache::CacheHelper, userdb::UserExt},
    dtos::{
        CreateAgentDto, FilterUserDto, LoginUserDto, RefreshTokenDto, RegisterUserDto, Response,
        TokenValidationDto, UserData, UserLoginResponseDto, UserResponseDto, SELF_REGISTERED_ROLE,
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::{User, UserRole},
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    let protected = Router::new()
        .route("/validate", get(validate))
        .route("/logout", post(logout))
        .route(
            "/create-agent",
            post(create_agent).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin])
            })),
        )
        .layer(middleware::from_fn(auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .merge(protected)
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = create_user(
        &app_state,
        body.name,
        body.email,
        body.password,
        SELF_REGISTERED_ROLE,
    )
    .await?;

    tracing::info!("Registered {} user {}", user.role.to_str(), user.id);

    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn create_agent(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateAgentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let agent = create_user(&app_state, body.name, body.email, body.password, UserRole::Agent).await?;

    tracing::info!("Admin {} created agent {}", admin.user.id, agent.id);

    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&agent),
            },
        }),
    ))
}

async fn create_user(
    app_state: &AppState,
    name: String,
    email: String,
    plain_password: String,
    role: UserRole,
) -> Result<User, HttpError> {
    let existing_user = app_state
        .db_client
        .get_user(None, Some(&email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing_user.is_some() {
        return Err(HttpError::unique_constraint_violation(
            ErrorMessage::EmailExist.to_string(),
        ));
    }

    let hashed_password = password::hash(&plain_password)
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state
        .db_client
        .save_user(name, email, hashed_password, role)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                HttpError::unique_constraint_violation(ErrorMessage::EmailExist.to_string())
            }
            e => HttpError::server_error(e.to_string()),
        })
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = result.ok_or(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }

    if !user.is_active {
        return Err(HttpError::forbidden(ErrorMessage::UserInactive.to_string()));
    }

    let token = token::create_token(
        &user.id.to_string(),
        &user.email,
        user.role,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token: token.clone(),
        user: FilterUserDto::filter_user(&user),
    });

    with_token_cookie(response, token, time::Duration::minutes(app_state.env.jwt_maxage))
}

pub async fn refresh(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RefreshTokenDto>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(redis_client) = &app_state.db_client.redis_client {
        let revoked = CacheHelper::exists(redis_client, &token::blacklist_key(&body.token))
            .await
            .unwrap_or(false);
        if revoked {
            return Err(HttpError::unauthorized(ErrorMessage::TokenRevoked.to_string()));
        }
    }

    let new_token = token::refresh_token(
        &body.token,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )?;

    let response = Json(serde_json::json!({
        "status": "success",
        "token": new_token,
    }));

    with_token_cookie(response, new_token, time::Duration::minutes(app_state.env.jwt_maxage))
}

pub async fn validate(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(serde_json::json!({
        "status": "success",
        "data": TokenValidationDto {
            valid: true,
            user_id: user.user.id,
            email: user.user.email,
            role: user.user.role,
        },
    })))
}

/// Revokes the presented token until it would have expired anyway.
pub async fn logout(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(redis_client) = &app_state.db_client.redis_client {
        let claims = token::decode_token(user.token.as_str(), app_state.env.jwt_secret.as_bytes())?;
        let ttl = token::remaining_lifetime(&claims) as usize;

        CacheHelper::flag(redis_client, &token::blacklist_key(&user.token), ttl)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
    } else {
        tracing::warn!("Redis unavailable; token for {} not revoked", user.user.id);
    }

    let response = Json(Response {
        status: "success",
        message: "Logged out successfully".to_string(),
    });

    with_token_cookie(response, String::new(), time::Duration::ZERO)
}

fn with_token_cookie(
    response: impl IntoResponse,
    token: String,
    max_age: time::Duration,
) -> Result<axum::response::Response, HttpError> {
    let cookie = Cookie::build(("token", token))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}
