// src/handlers/ferramentas.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        obra::ObraContext,
        rbac::{Admin, RequireRole},
    },
    models::{
        auth::Sessao,
        ferramenta::{Ferramenta, Situacao},
        movimentacao::{MovimentacaoComStatus, StatusMovimentacao},
    },
    services::ferramenta_service::DadosFerramenta,
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FerramentaPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Furadeira")]
    pub nome: String,

    #[validate(length(min = 1, message = "O patrimônio é obrigatório."))]
    #[schema(example = "PAT-01")]
    pub patrimonio: String,

    // Ausente = "Funcionando" no cadastro, situação atual na edição
    #[schema(value_type = Option<String>, example = "Em manutenção")]
    pub situacao: Option<Situacao>,

    pub data_manutencao: Option<NaiveDate>,
}

impl From<FerramentaPayload> for DadosFerramenta {
    fn from(p: FerramentaPayload) -> Self {
        Self {
            nome: p.nome,
            patrimonio: p.patrimonio,
            situacao: p.situacao,
            data_manutencao: p.data_manutencao,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetiradaPayload {
    #[validate(length(min = 1, message = "Informe o colaborador."))]
    #[schema(example = "João")]
    pub colaborador: String,
    pub data_prevista: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FiltroMovimentacoes {
    /// "Em aberto", "Atrasada" ou "Devolvida"
    #[param(value_type = Option<String>)]
    pub status: Option<StatusMovimentacao>,
}

// ---
// Ferramentas
// ---

// GET /api/ferramentas
#[utoipa::path(
    get,
    path = "/api/ferramentas",
    tag = "Ferramentas",
    responses((status = 200, description = "Ferramentas da obra", body = Vec<Ferramenta>)),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn list_ferramentas(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
) -> Result<Json<Vec<Ferramenta>>, AppError> {
    let ferramentas = app_state.ferramenta_service.listar_ferramentas(obra).await?;
    Ok(Json(ferramentas))
}

// GET /api/ferramentas/{id}
#[utoipa::path(
    get,
    path = "/api/ferramentas/{id}",
    tag = "Ferramentas",
    responses(
        (status = 200, body = Ferramenta),
        (status = 404, description = "Ferramenta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da ferramenta"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_ferramenta(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Ferramenta>, AppError> {
    Ok(Json(app_state.ferramenta_service.buscar_ferramenta(obra, id).await?))
}

// POST /api/ferramentas
#[utoipa::path(
    post,
    path = "/api/ferramentas",
    tag = "Ferramentas",
    request_body = FerramentaPayload,
    responses((status = 201, description = "Ferramenta cadastrada", body = Ferramenta)),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn create_ferramenta(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    _guard: RequireRole<Admin>,
    Json(payload): Json<FerramentaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let ferramenta = app_state
        .ferramenta_service
        .criar_ferramenta(obra, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ferramenta)))
}

// PUT /api/ferramentas/{id}
#[utoipa::path(
    put,
    path = "/api/ferramentas/{id}",
    tag = "Ferramentas",
    request_body = FerramentaPayload,
    responses(
        (status = 200, description = "Ferramenta atualizada", body = Ferramenta),
        (status = 409, description = "Mudança de situação não permitida")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da ferramenta"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_ferramenta(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FerramentaPayload>,
) -> Result<Json<Ferramenta>, AppError> {
    payload.validate()?;

    let ferramenta = app_state
        .ferramenta_service
        .atualizar_ferramenta(obra, id, payload.into())
        .await?;

    Ok(Json(ferramenta))
}

// DELETE /api/ferramentas/{id}
#[utoipa::path(
    delete,
    path = "/api/ferramentas/{id}",
    tag = "Ferramentas",
    responses(
        (status = 204, description = "Ferramenta excluída"),
        (status = 409, description = "Ferramenta com retirada em aberto")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da ferramenta"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_ferramenta(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.ferramenta_service.excluir_ferramenta(obra, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Movimentações
// ---

// POST /api/ferramentas/{id}/retirada
#[utoipa::path(
    post,
    path = "/api/ferramentas/{id}/retirada",
    tag = "Movimentações",
    request_body = RetiradaPayload,
    responses(
        (status = 201, description = "Retirada registrada", body = MovimentacaoComStatus),
        (status = 409, description = "Ferramenta indisponível para retirada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da ferramenta"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn registrar_retirada(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    sessao: Sessao,
    Path(id): Path<Uuid>,
    Json(payload): Json<RetiradaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    tracing::debug!(user_id = %sessao.user_id, ferramenta = %id, "Pedido de retirada");

    let movimentacao = app_state
        .ferramenta_service
        .registrar_retirada(obra, id, &payload.colaborador, payload.data_prevista)
        .await?;

    Ok((StatusCode::CREATED, Json(movimentacao)))
}

// POST /api/movimentacoes/{id}/devolucao
#[utoipa::path(
    post,
    path = "/api/movimentacoes/{id}/devolucao",
    tag = "Movimentações",
    responses(
        (status = 200, description = "Devolução registrada", body = MovimentacaoComStatus),
        (status = 409, description = "Movimentação já devolvida")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da movimentação"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn registrar_devolucao(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Path(id): Path<Uuid>,
) -> Result<Json<MovimentacaoComStatus>, AppError> {
    let movimentacao = app_state.ferramenta_service.registrar_devolucao(obra, id).await?;
    Ok(Json(movimentacao))
}

// GET /api/movimentacoes?status=
#[utoipa::path(
    get,
    path = "/api/movimentacoes",
    tag = "Movimentações",
    responses((status = 200, body = Vec<MovimentacaoComStatus>)),
    params(
        FiltroMovimentacoes,
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movimentacoes(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Query(filtro): Query<FiltroMovimentacoes>,
) -> Result<Json<Vec<MovimentacaoComStatus>>, AppError> {
    let movimentacoes = app_state
        .ferramenta_service
        .listar_movimentacoes(obra, filtro.status)
        .await?;
    Ok(Json(movimentacoes))
}

// GET /api/movimentacoes/abertas
#[utoipa::path(
    get,
    path = "/api/movimentacoes/abertas",
    tag = "Movimentações",
    responses((status = 200, body = Vec<MovimentacaoComStatus>)),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn list_movimentacoes_abertas(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
) -> Result<Json<Vec<MovimentacaoComStatus>>, AppError> {
    Ok(Json(app_state.ferramenta_service.listar_abertas(obra).await?))
}
