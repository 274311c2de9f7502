// src/db/colaborador_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::colaborador::Colaborador};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ColaboradorRepository: Send + Sync {
    async fn listar(&self) -> Result<Vec<Colaborador>, AppError>;
    async fn criar(&self, nome: String) -> Result<Colaborador, AppError>;
    async fn excluir(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgColaboradorRepository {
    pool: PgPool,
}

impl PgColaboradorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ColaboradorRepository for PgColaboradorRepository {
    async fn listar(&self) -> Result<Vec<Colaborador>, AppError> {
        let colaboradores =
            sqlx::query_as::<_, Colaborador>("SELECT * FROM colaboradores ORDER BY nome ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(colaboradores)
    }

    async fn criar(&self, nome: String) -> Result<Colaborador, AppError> {
        let colaborador = sqlx::query_as::<_, Colaborador>(
            "INSERT INTO colaboradores (nome) VALUES ($1) RETURNING *",
        )
        .bind(nome)
        .fetch_one(&self.pool)
        .await?;
        Ok(colaborador)
    }

    async fn excluir(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM colaboradores WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
