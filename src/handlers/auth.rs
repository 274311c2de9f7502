// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{Admin, RequireRole},
    models::auth::{AuthResponse, LoginUserPayload, RegisterUserPayload, Sessao, User},
};

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Sistema",
    responses((status = 200, description = "Servidor no ar"))
)]
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let resposta = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    Ok(Json(resposta))
}

// POST /api/auth/register (somente admin)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário cadastrado", body = User),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn register(
    State(app_state): State<AppState>,
    _guard: RequireRole<Admin>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .auth_service
        .register_user(&payload.email, &payload.password, &payload.nome, payload.role)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 204, description = "Todos os tokens do usuário foram invalidados")),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    sessao: Sessao,
) -> Result<StatusCode, AppError> {
    app_state.auth_service.logout(&sessao).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "Usuário da sessão", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    sessao: Sessao,
) -> Result<Json<User>, AppError> {
    Ok(Json(app_state.auth_service.me(&sessao).await?))
}
