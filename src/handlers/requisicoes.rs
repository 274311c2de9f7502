// src/handlers/requisicoes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        obra::ObraContext,
        rbac::{Admin, RequireRole},
    },
    models::requisicao::{NovaRequisicao, NovoRequisicaoItem, Requisicao, StatusRequisicao},
};

// `Serialize` é exigido pela validação de tamanho da lista em `itens`
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequisicaoItemPayload {
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    #[schema(example = "Cimento CP-II 50kg")]
    pub descricao: String,
    #[serde(default)]
    #[schema(example = "sc")]
    pub unidade: String,
    pub quantidade: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequisicaoPayload {
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    #[schema(example = "REQ-0042")]
    pub codigo: String,

    #[validate(length(min = 1, message = "O solicitante é obrigatório."))]
    pub solicitante: String,

    pub setor: Option<String>,
    pub engenheiro: Option<String>,

    #[validate(length(min = 1, message = "Inclua pelo menos um item."), nested)]
    pub itens: Vec<RequisicaoItemPayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusPayload {
    pub status: StatusRequisicao,
}

// GET /api/requisicoes
#[utoipa::path(
    get,
    path = "/api/requisicoes",
    tag = "Requisições",
    responses((status = 200, body = Vec<Requisicao>)),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn list_requisicoes(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
) -> Result<Json<Vec<Requisicao>>, AppError> {
    Ok(Json(app_state.requisicao_service.listar(obra).await?))
}

// GET /api/requisicoes/{id}
#[utoipa::path(
    get,
    path = "/api/requisicoes/{id}",
    tag = "Requisições",
    responses(
        (status = 200, body = Requisicao),
        (status = 404, description = "Requisição não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da requisição"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_requisicao(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Requisicao>, AppError> {
    Ok(Json(app_state.requisicao_service.buscar(obra, id).await?))
}

// POST /api/requisicoes
#[utoipa::path(
    post,
    path = "/api/requisicoes",
    tag = "Requisições",
    request_body = CreateRequisicaoPayload,
    responses(
        (status = 201, description = "Requisição criada", body = Requisicao),
        (status = 409, description = "Código já usado nesta obra")
    ),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn create_requisicao(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Json(payload): Json<CreateRequisicaoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let nova = NovaRequisicao {
        codigo: payload.codigo,
        solicitante: payload.solicitante,
        setor: payload.setor,
        engenheiro: payload.engenheiro,
        obra,
        itens: payload
            .itens
            .into_iter()
            .map(|i| NovoRequisicaoItem {
                descricao: i.descricao,
                unidade: i.unidade,
                quantidade: i.quantidade,
            })
            .collect(),
    };
    let requisicao = app_state.requisicao_service.criar(nova).await?;

    Ok((StatusCode::CREATED, Json(requisicao)))
}

// PUT /api/requisicoes/{id}/status
#[utoipa::path(
    put,
    path = "/api/requisicoes/{id}/status",
    tag = "Requisições",
    request_body = StatusPayload,
    responses((status = 200, body = Requisicao)),
    params(
        ("id" = Uuid, Path, description = "ID da requisição"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Requisicao>, AppError> {
    let requisicao = app_state
        .requisicao_service
        .atualizar_status(obra, id, payload.status)
        .await?;
    Ok(Json(requisicao))
}

// PUT /api/requisicoes/{id}/itens/{item_id}/recebido
#[utoipa::path(
    put,
    path = "/api/requisicoes/{id}/itens/{item_id}/recebido",
    tag = "Requisições",
    responses((status = 200, description = "Marcação de recebido invertida", body = Requisicao)),
    params(
        ("id" = Uuid, Path, description = "ID da requisição"),
        ("item_id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_recebido(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Requisicao>, AppError> {
    let requisicao = app_state
        .requisicao_service
        .alternar_recebido(obra, id, item_id)
        .await?;
    Ok(Json(requisicao))
}

// DELETE /api/requisicoes/{id}
#[utoipa::path(
    delete,
    path = "/api/requisicoes/{id}",
    tag = "Requisições",
    responses((status = 204, description = "Requisição excluída")),
    params(
        ("id" = Uuid, Path, description = "ID da requisição"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_requisicao(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.requisicao_service.excluir(obra, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(itens: serde_json::Value) -> CreateRequisicaoPayload {
        serde_json::from_value(json!({
            "codigo": "REQ-7",
            "solicitante": "Luiz",
            "itens": itens,
        }))
        .unwrap()
    }

    #[test]
    fn requisition_without_items_is_rejected() {
        let erros = payload(json!([])).validate().unwrap_err();
        assert!(erros.field_errors().contains_key("itens"));
    }

    #[test]
    fn item_without_description_fails_nested_validation() {
        let erros = payload(json!([{ "descricao": "", "quantidade": 1 }]))
            .validate()
            .unwrap_err();
        assert!(erros.errors().contains_key("itens"));

        assert!(payload(json!([{ "descricao": "Areia", "quantidade": 2 }]))
            .validate()
            .is_ok());
    }
}
