// src/models/estoque.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::obra::Obra;

// --- Item de consumo ---
// `quantidade` é o saldo mantido pelo livro de movimentos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstoqueItem {
    pub id: Uuid,
    #[schema(example = "Disco de corte 7\"")]
    pub nome: String,
    #[schema(example = "Abrasivos")]
    pub categoria: String,
    pub obra: Obra,
    #[schema(example = "12.0")]
    pub quantidade: Decimal,
    #[schema(example = "5.0")]
    pub minimo: Decimal,
    pub criado_em: DateTime<Utc>,
}

impl EstoqueItem {
    pub fn abaixo_do_minimo(&self) -> bool {
        self.quantidade <= self.minimo
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estoque_movimento_tipo", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum TipoMovimento {
    Entrada,
    Saida,
}

// --- Livro de entradas e saídas ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstoqueMovimento {
    pub id: Uuid,
    pub estoque_item_id: Uuid,
    pub tipo: TipoMovimento,
    pub quantidade: Decimal,
    pub usuario_id: Option<Uuid>,
    pub origem: Option<String>,
    pub observacao: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NovoEstoqueItem {
    pub nome: String,
    pub categoria: String,
    pub obra: Obra,
    pub quantidade_inicial: Decimal,
    pub minimo: Decimal,
    pub usuario_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtualizacaoEstoqueItem {
    pub nome: String,
    pub categoria: String,
    pub minimo: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NovoEstoqueMovimento {
    pub estoque_item_id: Uuid,
    pub tipo: TipoMovimento,
    pub quantidade: Decimal,
    pub usuario_id: Option<Uuid>,
    pub origem: Option<String>,
    pub observacao: Option<String>,
}

impl NovoEstoqueMovimento {
    /// Variação que o movimento aplica ao saldo.
    pub fn delta(&self) -> Decimal {
        match self.tipo {
            TipoMovimento::Entrada => self.quantidade,
            TipoMovimento::Saida => -self.quantidade,
        }
    }
}

/// Resultado de um movimento: o registro no livro e o saldo atualizado.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovimentoRegistrado {
    pub movimento: EstoqueMovimento,
    pub item: EstoqueItem,
}

/// Saldo gravado versus saldo do livro (Σ entradas - Σ saídas).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conciliacao {
    pub estoque_item_id: Uuid,
    pub quantidade: Decimal,
    pub saldo_livro: Decimal,
    pub divergencia: Decimal,
    pub conciliado: bool,
}

impl Conciliacao {
    pub fn new(item: &EstoqueItem, saldo_livro: Decimal) -> Self {
        let divergencia = item.quantidade - saldo_livro;
        Self {
            estoque_item_id: item.id,
            quantidade: item.quantidade,
            saldo_livro,
            divergencia,
            conciliado: divergencia.is_zero(),
        }
    }
}
