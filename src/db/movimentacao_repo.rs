// src/db/movimentacao_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        ferramenta::{Ferramenta, Gatilho, Situacao},
        movimentacao::{Movimentacao, NovaRetirada},
        obra::Obra,
    },
};

/// Livro de movimentações (tabela 'movimentacoes').
///
/// Retirada e devolução alteram também a situação da ferramenta. As duas
/// escritas acontecem na mesma transação.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovimentacaoRepository: Send + Sync {
    async fn listar(&self, obra: Obra) -> Result<Vec<Movimentacao>, AppError>;
    async fn listar_abertas(&self, obra: Obra) -> Result<Vec<Movimentacao>, AppError>;
    async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Option<Movimentacao>, AppError>;
    async fn possui_aberta(&self, ferramenta_id: Uuid) -> Result<bool, AppError>;
    async fn registrar_retirada(&self, nova: NovaRetirada) -> Result<Movimentacao, AppError>;
    async fn registrar_devolucao(
        &self,
        obra: Obra,
        id: Uuid,
        data_devolucao: DateTime<Utc>,
    ) -> Result<Movimentacao, AppError>;
}

#[derive(Clone)]
pub struct PgMovimentacaoRepository {
    pool: PgPool,
}

impl PgMovimentacaoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovimentacaoRepository for PgMovimentacaoRepository {
    async fn listar(&self, obra: Obra) -> Result<Vec<Movimentacao>, AppError> {
        let movimentacoes = sqlx::query_as::<_, Movimentacao>(
            "SELECT * FROM movimentacoes WHERE obra = $1 ORDER BY data_retirada DESC",
        )
        .bind(obra)
        .fetch_all(&self.pool)
        .await?;
        Ok(movimentacoes)
    }

    async fn listar_abertas(&self, obra: Obra) -> Result<Vec<Movimentacao>, AppError> {
        let movimentacoes = sqlx::query_as::<_, Movimentacao>(
            r#"
            SELECT * FROM movimentacoes
            WHERE obra = $1 AND data_devolucao IS NULL
            ORDER BY data_retirada DESC
            "#,
        )
        .bind(obra)
        .fetch_all(&self.pool)
        .await?;
        Ok(movimentacoes)
    }

    async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Option<Movimentacao>, AppError> {
        let movimentacao = sqlx::query_as::<_, Movimentacao>(
            "SELECT * FROM movimentacoes WHERE id = $1 AND obra = $2",
        )
        .bind(id)
        .bind(obra)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movimentacao)
    }

    async fn possui_aberta(&self, ferramenta_id: Uuid) -> Result<bool, AppError> {
        let existe = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM movimentacoes WHERE ferramenta_id = $1 AND data_devolucao IS NULL)",
        )
        .bind(ferramenta_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(existe)
    }

    async fn registrar_retirada(&self, nova: NovaRetirada) -> Result<Movimentacao, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava a ferramenta e revalida: outra retirada pode ter chegado antes
        let ferramenta = sqlx::query_as::<_, Ferramenta>(
            "SELECT * FROM ferramentas WHERE id = $1 FOR UPDATE",
        )
        .bind(nova.ferramenta_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NaoEncontrado("Ferramenta"))?;

        if ferramenta.situacao == Situacao::EmUso {
            return Err(AppError::FerramentaJaRetirada(ferramenta.patrimonio));
        }
        let nova_situacao = ferramenta.situacao.transicionar(&Gatilho::Retirada)?;

        let aberta = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM movimentacoes WHERE ferramenta_id = $1 AND data_devolucao IS NULL)",
        )
        .bind(ferramenta.id)
        .fetch_one(&mut *tx)
        .await?;
        if aberta {
            return Err(AppError::FerramentaJaRetirada(ferramenta.patrimonio));
        }

        // 2. Grava a movimentação com a cópia dos dados da ferramenta
        let movimentacao = sqlx::query_as::<_, Movimentacao>(
            r#"
            INSERT INTO movimentacoes
                (ferramenta_id, colaborador, ferramenta, patrimonio, obra, data_retirada, data_prevista, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'Em aberto')
            RETURNING *
            "#,
        )
        .bind(ferramenta.id)
        .bind(&nova.colaborador)
        .bind(&ferramenta.nome)
        .bind(&ferramenta.patrimonio)
        .bind(ferramenta.obra)
        .bind(nova.data_retirada)
        .bind(nova.data_prevista)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // índice parcial uq_movimentacoes_aberta
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::FerramentaJaRetirada(ferramenta.patrimonio.clone());
                }
            }
            AppError::from(e)
        })?;

        // 3. Ferramenta passa para "Em uso"
        sqlx::query(
            "UPDATE ferramentas SET situacao = $2, data_manutencao = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(ferramenta.id)
        .bind(nova_situacao.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(movimentacao)
    }

    async fn registrar_devolucao(
        &self,
        obra: Obra,
        id: Uuid,
        data_devolucao: DateTime<Utc>,
    ) -> Result<Movimentacao, AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = sqlx::query_as::<_, Movimentacao>(
            "SELECT * FROM movimentacoes WHERE id = $1 AND obra = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(obra)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NaoEncontrado("Movimentação"))?;

        if !atual.is_aberta() {
            return Err(AppError::MovimentacaoJaDevolvida);
        }

        let fechada = sqlx::query_as::<_, Movimentacao>(
            r#"
            UPDATE movimentacoes
            SET data_devolucao = $2, status = 'Devolvida'
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data_devolucao)
        .fetch_one(&mut *tx)
        .await?;

        let funcionando = Situacao::Funcionando;
        let afetadas = match atual.ferramenta_id {
            Some(ferramenta_id) => sqlx::query(
                "UPDATE ferramentas SET situacao = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(ferramenta_id)
            .bind(funcionando.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            // Registros antigos: casa por patrimônio, todas as ferramentas em uso
            None => sqlx::query(
                r#"
                UPDATE ferramentas SET situacao = $3, updated_at = NOW()
                WHERE obra = $1 AND patrimonio = $2 AND situacao = 'Em uso'
                "#,
            )
            .bind(atual.obra)
            .bind(&atual.patrimonio)
            .bind(funcionando.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
        };

        if afetadas == 0 {
            if atual.ferramenta_id.is_some() {
                // O rollback acontece ao descartar `tx`
                return Err(AppError::EstadoInconsistente(format!(
                    "movimentação {} aponta para uma ferramenta inexistente",
                    id
                )));
            }
            tracing::warn!(
                movimentacao = %id,
                patrimonio = %atual.patrimonio,
                "Devolução registrada sem ferramenta correspondente"
            );
        }

        tx.commit().await?;
        Ok(fechada)
    }
}
