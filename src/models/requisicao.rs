// src/models/requisicao.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::obra::Obra;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "requisicao_status")]
pub enum StatusRequisicao {
    #[sqlx(rename = "Pendente")]
    #[serde(rename = "Pendente")]
    Pendente,
    #[sqlx(rename = "Em Processo")]
    #[serde(rename = "Em Processo")]
    EmProcesso,
    #[sqlx(rename = "Concluída")]
    #[serde(rename = "Concluída")]
    Concluida,
}

// Cabeçalho como está na tabela 'requisicoes'
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RequisicaoCabecalho {
    pub id: Uuid,
    pub codigo: String,
    pub solicitante: String,
    pub setor: Option<String>,
    pub engenheiro: Option<String>,
    pub obra: Obra,
    pub status: StatusRequisicao,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequisicaoItem {
    pub id: Uuid,
    pub requisicao_id: Uuid,
    pub posicao: i32,
    #[schema(example = "Cimento CP-II 50kg")]
    pub descricao: String,
    #[schema(example = "saco")]
    pub unidade: String,
    pub quantidade: Decimal,
    pub recebido: bool,
}

/// Requisição completa, com os itens na ordem em que foram pedidos.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Requisicao {
    pub id: Uuid,
    #[schema(example = "REQ-0042")]
    pub codigo: String,
    pub solicitante: String,
    pub setor: Option<String>,
    pub engenheiro: Option<String>,
    pub obra: Obra,
    pub status: StatusRequisicao,
    pub created_at: DateTime<Utc>,
    pub itens: Vec<RequisicaoItem>,
}

impl Requisicao {
    pub fn montar(cabecalho: RequisicaoCabecalho, mut itens: Vec<RequisicaoItem>) -> Self {
        itens.sort_by_key(|item| item.posicao);
        Self {
            id: cabecalho.id,
            codigo: cabecalho.codigo,
            solicitante: cabecalho.solicitante,
            setor: cabecalho.setor,
            engenheiro: cabecalho.engenheiro,
            obra: cabecalho.obra,
            status: cabecalho.status,
            created_at: cabecalho.created_at,
            itens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NovaRequisicao {
    pub codigo: String,
    pub solicitante: String,
    pub setor: Option<String>,
    pub engenheiro: Option<String>,
    pub obra: Obra,
    pub itens: Vec<NovoRequisicaoItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NovoRequisicaoItem {
    pub descricao: String,
    pub unidade: String,
    pub quantidade: Decimal,
}
