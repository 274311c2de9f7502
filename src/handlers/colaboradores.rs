// src/handlers/colaboradores.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{Admin, RequireRole},
    models::colaborador::Colaborador,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ColaboradorPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "João da Silva")]
    pub nome: String,
}

// GET /api/colaboradores
#[utoipa::path(
    get,
    path = "/api/colaboradores",
    tag = "Colaboradores",
    responses((status = 200, body = Vec<Colaborador>)),
    security(("api_jwt" = []))
)]
pub async fn list_colaboradores(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Colaborador>>, AppError> {
    Ok(Json(app_state.colaborador_service.listar().await?))
}

// POST /api/colaboradores
#[utoipa::path(
    post,
    path = "/api/colaboradores",
    tag = "Colaboradores",
    request_body = ColaboradorPayload,
    responses((status = 201, body = Colaborador)),
    security(("api_jwt" = []))
)]
pub async fn create_colaborador(
    State(app_state): State<AppState>,
    _guard: RequireRole<Admin>,
    Json(payload): Json<ColaboradorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let colaborador = app_state.colaborador_service.criar(&payload.nome).await?;
    Ok((StatusCode::CREATED, Json(colaborador)))
}

// DELETE /api/colaboradores/{id}
#[utoipa::path(
    delete,
    path = "/api/colaboradores/{id}",
    tag = "Colaboradores",
    responses((status = 204, description = "Colaborador removido")),
    params(("id" = Uuid, Path, description = "ID do colaborador")),
    security(("api_jwt" = []))
)]
pub async fn delete_colaborador(
    State(app_state): State<AppState>,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.colaborador_service.excluir(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
