// src/db/ferramenta_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        ferramenta::{AtualizacaoFerramenta, Ferramenta, NovaFerramenta},
        obra::Obra,
    },
};

/// Registro de ferramentas (tabela 'ferramentas').
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FerramentaRepository: Send + Sync {
    async fn listar(&self, obra: Obra) -> Result<Vec<Ferramenta>, AppError>;
    async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Option<Ferramenta>, AppError>;
    async fn criar(&self, nova: NovaFerramenta) -> Result<Ferramenta, AppError>;
    async fn atualizar(
        &self,
        obra: Obra,
        id: Uuid,
        dados: AtualizacaoFerramenta,
    ) -> Result<Option<Ferramenta>, AppError>;
    async fn excluir(&self, obra: Obra, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgFerramentaRepository {
    pool: PgPool,
}

impl PgFerramentaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FerramentaRepository for PgFerramentaRepository {
    async fn listar(&self, obra: Obra) -> Result<Vec<Ferramenta>, AppError> {
        let ferramentas = sqlx::query_as::<_, Ferramenta>(
            "SELECT * FROM ferramentas WHERE obra = $1 ORDER BY nome ASC, patrimonio ASC",
        )
        .bind(obra)
        .fetch_all(&self.pool)
        .await?;
        Ok(ferramentas)
    }

    async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Option<Ferramenta>, AppError> {
        let ferramenta = sqlx::query_as::<_, Ferramenta>(
            "SELECT * FROM ferramentas WHERE id = $1 AND obra = $2",
        )
        .bind(id)
        .bind(obra)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ferramenta)
    }

    async fn criar(&self, nova: NovaFerramenta) -> Result<Ferramenta, AppError> {
        let ferramenta = sqlx::query_as::<_, Ferramenta>(
            r#"
            INSERT INTO ferramentas (nome, patrimonio, situacao, obra, data_manutencao)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&nova.nome)
        .bind(&nova.patrimonio)
        .bind(nova.situacao.as_str())
        .bind(nova.obra)
        .bind(nova.data_manutencao)
        .fetch_one(&self.pool)
        .await?;
        Ok(ferramenta)
    }

    async fn atualizar(
        &self,
        obra: Obra,
        id: Uuid,
        dados: AtualizacaoFerramenta,
    ) -> Result<Option<Ferramenta>, AppError> {
        let ferramenta = sqlx::query_as::<_, Ferramenta>(
            r#"
            UPDATE ferramentas
            SET nome = $3,
                patrimonio = $4,
                situacao = $5,
                data_manutencao = $6,
                updated_at = NOW()
            WHERE id = $1 AND obra = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(obra)
        .bind(&dados.nome)
        .bind(&dados.patrimonio)
        .bind(dados.situacao.as_str())
        .bind(dados.data_manutencao)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ferramenta)
    }

    async fn excluir(&self, obra: Obra, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ferramentas WHERE id = $1 AND obra = $2")
            .bind(id)
            .bind(obra)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
