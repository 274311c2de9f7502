// src/models/ferramenta.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{common::error::AppError, models::obra::Obra};

// --- Situação da ferramenta ---
// Gravada como TEXT. Valores antigos fora da lista caem em `Outro`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Situacao {
    Funcionando,
    EmUso,
    ComDefeito,
    EmManutencao,
    Outro(String),
}

impl Situacao {
    /// Ordem fixa dos grupos nos relatórios.
    pub const CONHECIDAS: [Situacao; 4] = [
        Situacao::Funcionando,
        Situacao::EmUso,
        Situacao::ComDefeito,
        Situacao::EmManutencao,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Situacao::Funcionando => "Funcionando",
            Situacao::EmUso => "Em uso",
            Situacao::ComDefeito => "Com defeito",
            Situacao::EmManutencao => "Em manutenção",
            Situacao::Outro(valor) => valor,
        }
    }

    pub fn is_conhecida(&self) -> bool {
        !matches!(self, Situacao::Outro(_))
    }

    /// Aplica a tabela de transições. Retorna a nova situação ou
    /// `TransicaoInvalida`.
    ///
    /// | gatilho   | de                         | para                     |
    /// |-----------|----------------------------|--------------------------|
    /// | Retirada  | Funcionando                | Em uso                   |
    /// | Devolucao | Em uso                     | Funcionando              |
    /// | Edicao    | qualquer uma, exceto Em uso| conhecida, exceto Em uso |
    ///
    /// Uma edição que mantém a situação atual é sempre aceita.
    pub fn transicionar(&self, gatilho: &Gatilho) -> Result<Situacao, AppError> {
        let destino = match gatilho {
            Gatilho::Retirada => Situacao::EmUso,
            Gatilho::Devolucao => Situacao::Funcionando,
            Gatilho::Edicao(destino) => destino.clone(),
        };

        let permitido = match gatilho {
            Gatilho::Retirada => *self == Situacao::Funcionando,
            Gatilho::Devolucao => *self == Situacao::EmUso,
            Gatilho::Edicao(destino) if destino == self => true,
            Gatilho::Edicao(destino) => {
                *self != Situacao::EmUso && *destino != Situacao::EmUso && destino.is_conhecida()
            }
        };

        if permitido {
            Ok(destino)
        } else {
            Err(AppError::TransicaoInvalida {
                de: self.to_string(),
                para: destino.to_string(),
            })
        }
    }
}

impl From<String> for Situacao {
    fn from(valor: String) -> Self {
        match valor.trim() {
            "Funcionando" => Situacao::Funcionando,
            "Em uso" => Situacao::EmUso,
            "Com defeito" => Situacao::ComDefeito,
            "Em manutenção" | "Em manutencao" => Situacao::EmManutencao,
            _ => Situacao::Outro(valor),
        }
    }
}

impl From<Situacao> for String {
    fn from(situacao: Situacao) -> Self {
        match situacao {
            Situacao::Outro(valor) => valor,
            conhecida => conhecida.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Situacao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// O que está provocando a mudança de situação.
#[derive(Debug, Clone, PartialEq)]
pub enum Gatilho {
    Retirada,
    Devolucao,
    Edicao(Situacao),
}

// --- Ferramenta (registro físico rastreável) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ferramenta {
    pub id: Uuid,
    #[schema(example = "Furadeira")]
    pub nome: String,
    #[schema(example = "PAT-01")]
    pub patrimonio: String,
    #[sqlx(try_from = "String")]
    #[schema(value_type = String, example = "Funcionando")]
    pub situacao: Situacao,
    pub obra: Obra,
    pub data_manutencao: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados para cadastrar uma ferramenta (já validados).
#[derive(Debug, Clone, PartialEq)]
pub struct NovaFerramenta {
    pub nome: String,
    pub patrimonio: String,
    pub situacao: Situacao,
    pub obra: Obra,
    pub data_manutencao: Option<NaiveDate>,
}

/// Estado final de uma edição, já com a transição aplicada.
#[derive(Debug, Clone, PartialEq)]
pub struct AtualizacaoFerramenta {
    pub nome: String,
    pub patrimonio: String,
    pub situacao: Situacao,
    pub data_manutencao: Option<NaiveDate>,
}

/// `data_manutencao` só faz sentido em manutenção.
pub fn data_manutencao_para(situacao: &Situacao, data: Option<NaiveDate>) -> Option<NaiveDate> {
    match situacao {
        Situacao::EmManutencao => data,
        _ => None,
    }
}
