// src/db/requisicao_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        obra::Obra,
        requisicao::{
            NovaRequisicao, Requisicao, RequisicaoCabecalho, RequisicaoItem, StatusRequisicao,
        },
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequisicaoRepository: Send + Sync {
    async fn listar(&self, obra: Obra) -> Result<Vec<Requisicao>, AppError>;
    async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Option<Requisicao>, AppError>;
    async fn criar(&self, nova: NovaRequisicao) -> Result<Requisicao, AppError>;
    async fn atualizar_status(
        &self,
        obra: Obra,
        id: Uuid,
        status: StatusRequisicao,
    ) -> Result<Option<Requisicao>, AppError>;
    async fn alternar_recebido(
        &self,
        obra: Obra,
        id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<Requisicao>, AppError>;
    async fn excluir(&self, obra: Obra, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgRequisicaoRepository {
    pool: PgPool,
}

impl PgRequisicaoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn itens_de<'e, E>(
        &self,
        executor: E,
        ids: &[Uuid],
    ) -> Result<Vec<RequisicaoItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let itens = sqlx::query_as::<_, RequisicaoItem>(
            "SELECT * FROM requisicao_itens WHERE requisicao_id = ANY($1) ORDER BY posicao ASC",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(itens)
    }
}

#[async_trait]
impl RequisicaoRepository for PgRequisicaoRepository {
    async fn listar(&self, obra: Obra) -> Result<Vec<Requisicao>, AppError> {
        let cabecalhos = sqlx::query_as::<_, RequisicaoCabecalho>(
            "SELECT * FROM requisicoes WHERE obra = $1 ORDER BY created_at DESC",
        )
        .bind(obra)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = cabecalhos.iter().map(|c| c.id).collect();
        let mut por_requisicao: HashMap<Uuid, Vec<RequisicaoItem>> = HashMap::new();
        for item in self.itens_de(&self.pool, &ids).await? {
            por_requisicao.entry(item.requisicao_id).or_default().push(item);
        }

        Ok(cabecalhos
            .into_iter()
            .map(|c| {
                let itens = por_requisicao.remove(&c.id).unwrap_or_default();
                Requisicao::montar(c, itens)
            })
            .collect())
    }

    async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Option<Requisicao>, AppError> {
        let cabecalho = sqlx::query_as::<_, RequisicaoCabecalho>(
            "SELECT * FROM requisicoes WHERE id = $1 AND obra = $2",
        )
        .bind(id)
        .bind(obra)
        .fetch_optional(&self.pool)
        .await?;

        match cabecalho {
            Some(c) => {
                let itens = self.itens_de(&self.pool, &[c.id]).await?;
                Ok(Some(Requisicao::montar(c, itens)))
            }
            None => Ok(None),
        }
    }

    async fn criar(&self, nova: NovaRequisicao) -> Result<Requisicao, AppError> {
        let mut tx = self.pool.begin().await?;

        let cabecalho = sqlx::query_as::<_, RequisicaoCabecalho>(
            r#"
            INSERT INTO requisicoes (codigo, solicitante, setor, engenheiro, obra)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&nova.codigo)
        .bind(&nova.solicitante)
        .bind(nova.setor.as_deref())
        .bind(nova.engenheiro.as_deref())
        .bind(nova.obra)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::RequisicaoCodigoDuplicado(nova.codigo.clone())))?;

        let mut itens = Vec::with_capacity(nova.itens.len());
        for (posicao, item) in nova.itens.iter().enumerate() {
            let gravado = sqlx::query_as::<_, RequisicaoItem>(
                r#"
                INSERT INTO requisicao_itens (requisicao_id, posicao, descricao, unidade, quantidade)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(cabecalho.id)
            .bind(posicao as i32)
            .bind(&item.descricao)
            .bind(&item.unidade)
            .bind(item.quantidade)
            .fetch_one(&mut *tx)
            .await?;
            itens.push(gravado);
        }

        tx.commit().await?;
        Ok(Requisicao::montar(cabecalho, itens))
    }

    async fn atualizar_status(
        &self,
        obra: Obra,
        id: Uuid,
        status: StatusRequisicao,
    ) -> Result<Option<Requisicao>, AppError> {
        let result = sqlx::query("UPDATE requisicoes SET status = $3 WHERE id = $1 AND obra = $2")
            .bind(id)
            .bind(obra)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.buscar(obra, id).await
    }

    async fn alternar_recebido(
        &self,
        obra: Obra,
        id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<Requisicao>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE requisicao_itens AS i
            SET recebido = NOT i.recebido
            FROM requisicoes AS r
            WHERE i.id = $1 AND i.requisicao_id = $2 AND r.id = i.requisicao_id AND r.obra = $3
            "#,
        )
        .bind(item_id)
        .bind(id)
        .bind(obra)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.buscar(obra, id).await
    }

    async fn excluir(&self, obra: Obra, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM requisicoes WHERE id = $1 AND obra = $2")
            .bind(id)
            .bind(obra)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
