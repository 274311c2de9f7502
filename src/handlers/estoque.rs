// src/handlers/estoque.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        obra::ObraContext,
        rbac::{Admin, RequireRole},
    },
    models::{
        auth::Sessao,
        estoque::{
            AtualizacaoEstoqueItem, Conciliacao, EstoqueItem, EstoqueMovimento,
            MovimentoRegistrado, NovoEstoqueItem, NovoEstoqueMovimento, TipoMovimento,
        },
    },
};

// ---
// Validação Customizada
// ---
// Colunas NUMERIC(14, 3)
const ESCALA_MAXIMA: u32 = 3;

fn validate_escala(val: &Decimal) -> Result<(), ValidationError> {
    if val.normalize().scale() > ESCALA_MAXIMA {
        let mut err = ValidationError::new("scale");
        err.add_param("max".into(), &ESCALA_MAXIMA);
        err.message = Some("Use no máximo 3 casas decimais.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    validate_escala(val)?;
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    validate_escala(val)?;
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_min".into(), &0.0);
        err.message = Some("A quantidade deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEstoqueItemPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,

    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub categoria: String,

    // Vira uma entrada "Cadastro inicial" no livro
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub quantidade_inicial: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub minimo: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEstoqueItemPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,

    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub categoria: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub minimo: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovimentoPayload {
    pub tipo: TipoMovimento,

    #[validate(custom(function = "validate_positive"))]
    pub quantidade: Decimal,

    #[schema(example = "Compra NF 1234")]
    pub origem: Option<String>,
    pub observacao: Option<String>,
}

// ---
// Itens
// ---

// GET /api/estoque/itens
#[utoipa::path(
    get,
    path = "/api/estoque/itens",
    tag = "Estoque",
    responses((status = 200, body = Vec<EstoqueItem>)),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn list_itens(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
) -> Result<Json<Vec<EstoqueItem>>, AppError> {
    Ok(Json(app_state.estoque_service.listar_itens(obra).await?))
}

// GET /api/estoque/itens/{id}
#[utoipa::path(
    get,
    path = "/api/estoque/itens/{id}",
    tag = "Estoque",
    responses((status = 200, body = EstoqueItem), (status = 404, description = "Item não encontrado")),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Path(id): Path<Uuid>,
) -> Result<Json<EstoqueItem>, AppError> {
    Ok(Json(app_state.estoque_service.buscar_item(obra, id).await?))
}

// POST /api/estoque/itens
#[utoipa::path(
    post,
    path = "/api/estoque/itens",
    tag = "Estoque",
    request_body = CreateEstoqueItemPayload,
    responses((status = 201, description = "Item cadastrado", body = EstoqueItem)),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    sessao: Sessao,
    _guard: RequireRole<Admin>,
    Json(payload): Json<CreateEstoqueItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .estoque_service
        .criar_item(NovoEstoqueItem {
            nome: payload.nome.trim().to_string(),
            categoria: payload.categoria.trim().to_string(),
            obra,
            quantidade_inicial: payload.quantidade_inicial,
            minimo: payload.minimo,
            usuario_id: Some(sessao.user_id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// PUT /api/estoque/itens/{id}
#[utoipa::path(
    put,
    path = "/api/estoque/itens/{id}",
    tag = "Estoque",
    request_body = UpdateEstoqueItemPayload,
    responses((status = 200, body = EstoqueItem)),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEstoqueItemPayload>,
) -> Result<Json<EstoqueItem>, AppError> {
    payload.validate()?;

    let item = app_state
        .estoque_service
        .atualizar_item(
            obra,
            id,
            AtualizacaoEstoqueItem {
                nome: payload.nome.trim().to_string(),
                categoria: payload.categoria.trim().to_string(),
                minimo: payload.minimo,
            },
        )
        .await?;

    Ok(Json(item))
}

// DELETE /api/estoque/itens/{id}
#[utoipa::path(
    delete,
    path = "/api/estoque/itens/{id}",
    tag = "Estoque",
    responses((status = 204, description = "Item e seus movimentos excluídos")),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.estoque_service.excluir_item(obra, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Movimentos
// ---

// GET /api/estoque/itens/{id}/movimentos
#[utoipa::path(
    get,
    path = "/api/estoque/itens/{id}/movimentos",
    tag = "Estoque",
    responses((status = 200, body = Vec<EstoqueMovimento>)),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movimentos(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EstoqueMovimento>>, AppError> {
    Ok(Json(app_state.estoque_service.listar_movimentos(obra, id).await?))
}

// POST /api/estoque/itens/{id}/movimentos
#[utoipa::path(
    post,
    path = "/api/estoque/itens/{id}/movimentos",
    tag = "Estoque",
    request_body = MovimentoPayload,
    responses(
        (status = 201, description = "Movimento registrado", body = MovimentoRegistrado),
        (status = 400, description = "Saldo insuficiente para a saída")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn registrar_movimento(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    sessao: Sessao,
    Path(id): Path<Uuid>,
    Json(payload): Json<MovimentoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let registrado = app_state
        .estoque_service
        .registrar_movimento(
            obra,
            NovoEstoqueMovimento {
                estoque_item_id: id,
                tipo: payload.tipo,
                quantidade: payload.quantidade,
                usuario_id: Some(sessao.user_id),
                origem: payload.origem,
                observacao: payload.observacao,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(registrado)))
}

// POST /api/estoque/itens/{id}/incrementar
#[utoipa::path(
    post,
    path = "/api/estoque/itens/{id}/incrementar",
    tag = "Estoque",
    responses((status = 200, description = "Entrada de uma unidade", body = MovimentoRegistrado)),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn incrementar(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    sessao: Sessao,
    Path(id): Path<Uuid>,
) -> Result<Json<MovimentoRegistrado>, AppError> {
    let registrado = app_state
        .estoque_service
        .ajustar_uma_unidade(obra, id, TipoMovimento::Entrada, Some(sessao.user_id))
        .await?;
    Ok(Json(registrado))
}

// POST /api/estoque/itens/{id}/decrementar
#[utoipa::path(
    post,
    path = "/api/estoque/itens/{id}/decrementar",
    tag = "Estoque",
    responses(
        (status = 200, description = "Saída de uma unidade", body = MovimentoRegistrado),
        (status = 400, description = "Item sem saldo")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn decrementar(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    sessao: Sessao,
    Path(id): Path<Uuid>,
) -> Result<Json<MovimentoRegistrado>, AppError> {
    let registrado = app_state
        .estoque_service
        .ajustar_uma_unidade(obra, id, TipoMovimento::Saida, Some(sessao.user_id))
        .await?;
    Ok(Json(registrado))
}

// GET /api/estoque/itens/{id}/conciliacao
#[utoipa::path(
    get,
    path = "/api/estoque/itens/{id}/conciliacao",
    tag = "Estoque",
    responses((status = 200, description = "Saldo comparado ao livro de movimentos", body = Conciliacao)),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn conciliacao(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    _guard: RequireRole<Admin>,
    Path(id): Path<Uuid>,
) -> Result<Json<Conciliacao>, AppError> {
    Ok(Json(app_state.estoque_service.conciliar(obra, id).await?))
}
