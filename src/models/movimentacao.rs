// src/models/movimentacao.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::obra::Obra;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum StatusMovimentacao {
    #[serde(rename = "Em aberto")]
    EmAberto,
    #[serde(rename = "Atrasada")]
    Atrasada,
    #[serde(rename = "Devolvida")]
    Devolvida,
}

impl StatusMovimentacao {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusMovimentacao::EmAberto => "Em aberto",
            StatusMovimentacao::Atrasada => "Atrasada",
            StatusMovimentacao::Devolvida => "Devolvida",
        }
    }
}

// --- Movimentação: um ciclo retirada/devolução ---
// `ferramenta` e `patrimonio` são uma cópia do registro no momento da retirada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movimentacao {
    pub id: Uuid,
    // NULL quando a ferramenta foi excluída ou em registros antigos
    pub ferramenta_id: Option<Uuid>,
    #[schema(example = "João")]
    pub colaborador: String,
    #[schema(example = "Furadeira")]
    pub ferramenta: String,
    #[schema(example = "PAT-01")]
    pub patrimonio: String,
    pub obra: Obra,
    pub data_retirada: DateTime<Utc>,
    pub data_prevista: Option<DateTime<Utc>>,
    pub data_devolucao: Option<DateTime<Utc>>,
}

impl Movimentacao {
    /// Status derivado. Nunca é lido do banco: "Atrasada" depende do instante.
    pub fn status_em(&self, agora: DateTime<Utc>) -> StatusMovimentacao {
        if self.data_devolucao.is_some() {
            return StatusMovimentacao::Devolvida;
        }
        match self.data_prevista {
            Some(prevista) if prevista < agora => StatusMovimentacao::Atrasada,
            _ => StatusMovimentacao::EmAberto,
        }
    }

    pub fn is_aberta(&self) -> bool {
        self.data_devolucao.is_none()
    }
}

/// Movimentação com o status calculado no momento da leitura.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovimentacaoComStatus {
    #[serde(flatten)]
    pub movimentacao: Movimentacao,
    pub status: StatusMovimentacao,
}

impl MovimentacaoComStatus {
    pub fn em(movimentacao: Movimentacao, agora: DateTime<Utc>) -> Self {
        let status = movimentacao.status_em(agora);
        Self { movimentacao, status }
    }
}

/// Dados de uma nova retirada, montados pelo serviço.
#[derive(Debug, Clone, PartialEq)]
pub struct NovaRetirada {
    pub ferramenta_id: Uuid,
    pub colaborador: String,
    pub data_prevista: Option<DateTime<Utc>>,
    pub data_retirada: DateTime<Utc>,
}
