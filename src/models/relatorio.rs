// src/models/relatorio.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{
    ferramenta::Ferramenta,
    movimentacao::StatusMovimentacao,
    obra::Obra,
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatorioFerramentas {
    pub obra: Obra,
    pub gerado_em: DateTime<Utc>,
    pub total: usize,
    pub grupos: Vec<GrupoSituacao>,
}

/// Um dos grupos fixos (Funcionando, Em uso, ...) ou "Outros".
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrupoSituacao {
    #[schema(example = "Em uso")]
    pub situacao: String,
    pub total: usize,
    pub subgrupos: Vec<SubgrupoNome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubgrupoNome {
    #[schema(example = "Furadeira")]
    pub nome: String,
    pub total: usize,
    pub ferramentas: Vec<LinhaRelatorio>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinhaRelatorio {
    pub ferramenta: Ferramenta,
    pub retirada: Option<RetiradaAberta>,
}

/// Dados da retirada em aberto de uma ferramenta "Em uso".
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetiradaAberta {
    pub colaborador: String,
    pub data_retirada: DateTime<Utc>,
    pub data_prevista: Option<DateTime<Utc>>,
    pub status: StatusMovimentacao,
}
