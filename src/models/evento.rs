// src/models/evento.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::obra::Obra;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tabela {
    Ferramentas,
    Movimentacoes,
    EstoqueItens,
    EstoqueMovimentos,
    Requisicoes,
    Colaboradores,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Acao {
    Insert,
    Update,
    Delete,
}

/// Sinal de invalidação de cache: o cliente deve buscar os dados de novo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventoAlteracao {
    // None para tabelas que não pertencem a uma obra (colaboradores)
    pub obra: Option<Obra>,
    pub tabela: Tabela,
    pub acao: Acao,
}
