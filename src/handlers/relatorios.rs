// src/handlers/relatorios.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::obra::ObraContext,
    models::{obra::Obra, relatorio::RelatorioFerramentas},
    services::exportacao,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportacaoQuery {
    /// Inclui as duas obras na planilha
    #[serde(default)]
    pub todas: bool,
}

fn obras_da_exportacao(obra: Obra, query: &ExportacaoQuery) -> Vec<Obra> {
    if query.todas {
        Obra::TODAS.to_vec()
    } else {
        vec![obra]
    }
}

fn anexo_csv(nome: &str, obras: &[Obra], conteudo: String) -> Response {
    let sufixo = match obras {
        [obra] => obra.slug(),
        _ => "todas",
    };
    let disposicao = format!(
        "attachment; filename=\"{}-{}-{}.csv\"",
        nome,
        sufixo,
        Utc::now().format("%Y%m%d")
    );
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposicao),
        ],
        conteudo,
    )
        .into_response()
}

// GET /api/relatorios/ferramentas
#[utoipa::path(
    get,
    path = "/api/relatorios/ferramentas",
    tag = "Relatórios",
    responses((status = 200, description = "Ferramentas agrupadas por situação e nome", body = RelatorioFerramentas)),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn relatorio_ferramentas(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
) -> Result<Json<RelatorioFerramentas>, AppError> {
    Ok(Json(app_state.relatorio_service.gerar(obra).await?))
}

// GET /api/relatorios/ferramentas/csv
#[utoipa::path(
    get,
    path = "/api/relatorios/ferramentas/csv",
    tag = "Relatórios",
    responses((status = 200, description = "Planilha CSV (UTF-8 com BOM, separador ';')", content_type = "text/csv")),
    params(
        ExportacaoQuery,
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn csv_ferramentas(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Query(query): Query<ExportacaoQuery>,
) -> Result<Response, AppError> {
    let obras = obras_da_exportacao(obra, &query);
    let mut ferramentas = Vec::new();
    for o in &obras {
        ferramentas.extend(app_state.ferramenta_service.listar_ferramentas(*o).await?);
    }

    let conteudo = exportacao::csv_ferramentas(&ferramentas, Utc::now());
    Ok(anexo_csv("ferramentas", &obras, conteudo))
}

// GET /api/relatorios/estoque/csv
#[utoipa::path(
    get,
    path = "/api/relatorios/estoque/csv",
    tag = "Relatórios",
    responses((status = 200, description = "Planilha CSV (UTF-8 com BOM, separador ';')", content_type = "text/csv")),
    params(
        ExportacaoQuery,
        ("x-obra" = String, Header, description = "Obra: masters ou honda")
    ),
    security(("api_jwt" = []))
)]
pub async fn csv_estoque(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
    Query(query): Query<ExportacaoQuery>,
) -> Result<Response, AppError> {
    let obras = obras_da_exportacao(obra, &query);
    let mut itens = Vec::new();
    for o in &obras {
        itens.extend(app_state.estoque_service.listar_itens(*o).await?);
    }

    let conteudo = exportacao::csv_estoque(&itens, Utc::now());
    Ok(anexo_csv("estoque", &obras, conteudo))
}
