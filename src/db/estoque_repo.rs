// src/db/estoque_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        estoque::{
            AtualizacaoEstoqueItem, EstoqueItem, EstoqueMovimento, MovimentoRegistrado,
            NovoEstoqueItem, NovoEstoqueMovimento, TipoMovimento,
        },
        obra::Obra,
    },
};

/// Itens de consumo e o livro de entradas/saídas.
///
/// `quantidade` só muda junto com um movimento, na mesma transação.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EstoqueRepository: Send + Sync {
    async fn listar_itens(&self, obra: Obra) -> Result<Vec<EstoqueItem>, AppError>;
    async fn buscar_item(&self, obra: Obra, id: Uuid) -> Result<Option<EstoqueItem>, AppError>;
    async fn criar_item(&self, novo: NovoEstoqueItem) -> Result<EstoqueItem, AppError>;
    async fn atualizar_item(
        &self,
        obra: Obra,
        id: Uuid,
        dados: AtualizacaoEstoqueItem,
    ) -> Result<Option<EstoqueItem>, AppError>;
    async fn excluir_item(&self, obra: Obra, id: Uuid) -> Result<bool, AppError>;
    async fn registrar_movimento(
        &self,
        obra: Obra,
        novo: NovoEstoqueMovimento,
    ) -> Result<MovimentoRegistrado, AppError>;
    async fn listar_movimentos(&self, item_id: Uuid) -> Result<Vec<EstoqueMovimento>, AppError>;
    async fn saldo_livro(&self, item_id: Uuid) -> Result<Decimal, AppError>;
}

#[derive(Clone)]
pub struct PgEstoqueRepository {
    pool: PgPool,
}

impl PgEstoqueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grava uma linha no livro-razão.
    async fn inserir_movimento<'e, E>(
        &self,
        executor: E,
        novo: &NovoEstoqueMovimento,
    ) -> Result<EstoqueMovimento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimento = sqlx::query_as::<_, EstoqueMovimento>(
            r#"
            INSERT INTO estoque_movimentos (estoque_item_id, tipo, quantidade, usuario_id, origem, observacao)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(novo.estoque_item_id)
        .bind(novo.tipo)
        .bind(novo.quantidade)
        .bind(novo.usuario_id)
        .bind(novo.origem.as_deref())
        .bind(novo.observacao.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(movimento)
    }
}

#[async_trait]
impl EstoqueRepository for PgEstoqueRepository {
    async fn listar_itens(&self, obra: Obra) -> Result<Vec<EstoqueItem>, AppError> {
        let itens = sqlx::query_as::<_, EstoqueItem>(
            "SELECT * FROM estoque_itens WHERE obra = $1 ORDER BY categoria ASC, nome ASC",
        )
        .bind(obra)
        .fetch_all(&self.pool)
        .await?;
        Ok(itens)
    }

    async fn buscar_item(&self, obra: Obra, id: Uuid) -> Result<Option<EstoqueItem>, AppError> {
        let item = sqlx::query_as::<_, EstoqueItem>(
            "SELECT * FROM estoque_itens WHERE id = $1 AND obra = $2",
        )
        .bind(id)
        .bind(obra)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn criar_item(&self, novo: NovoEstoqueItem) -> Result<EstoqueItem, AppError> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, EstoqueItem>(
            r#"
            INSERT INTO estoque_itens (nome, categoria, obra, quantidade, minimo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&novo.nome)
        .bind(&novo.categoria)
        .bind(novo.obra)
        .bind(novo.quantidade_inicial)
        .bind(novo.minimo)
        .fetch_one(&mut *tx)
        .await?;

        // O saldo inicial também entra no livro, para que ele feche com 'quantidade'
        if novo.quantidade_inicial > Decimal::ZERO {
            let inicial = NovoEstoqueMovimento {
                estoque_item_id: item.id,
                tipo: TipoMovimento::Entrada,
                quantidade: novo.quantidade_inicial,
                usuario_id: novo.usuario_id,
                origem: Some("Cadastro inicial".to_string()),
                observacao: None,
            };
            self.inserir_movimento(&mut *tx, &inicial).await?;
        }

        tx.commit().await?;
        Ok(item)
    }

    async fn atualizar_item(
        &self,
        obra: Obra,
        id: Uuid,
        dados: AtualizacaoEstoqueItem,
    ) -> Result<Option<EstoqueItem>, AppError> {
        let item = sqlx::query_as::<_, EstoqueItem>(
            r#"
            UPDATE estoque_itens
            SET nome = $3, categoria = $4, minimo = $5
            WHERE id = $1 AND obra = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(obra)
        .bind(&dados.nome)
        .bind(&dados.categoria)
        .bind(dados.minimo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn excluir_item(&self, obra: Obra, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM estoque_itens WHERE id = $1 AND obra = $2")
            .bind(id)
            .bind(obra)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn registrar_movimento(
        &self,
        obra: Obra,
        novo: NovoEstoqueMovimento,
    ) -> Result<MovimentoRegistrado, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava o saldo e revalida a saída sob o lock
        let atual = sqlx::query_as::<_, EstoqueItem>(
            "SELECT * FROM estoque_itens WHERE id = $1 AND obra = $2 FOR UPDATE",
        )
        .bind(novo.estoque_item_id)
        .bind(obra)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NaoEncontrado("Item de estoque"))?;

        if novo.tipo == TipoMovimento::Saida && novo.quantidade > atual.quantidade {
            return Err(AppError::EstoqueInsuficiente {
                disponivel: atual.quantidade,
                solicitado: novo.quantidade,
            });
        }

        // 2. Livro-razão
        let movimento = self.inserir_movimento(&mut *tx, &novo).await?;

        // 3. Saldo
        let item = sqlx::query_as::<_, EstoqueItem>(
            "UPDATE estoque_itens SET quantidade = quantidade + $2 WHERE id = $1 RETURNING *",
        )
        .bind(atual.id)
        .bind(novo.delta())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(MovimentoRegistrado { movimento, item })
    }

    async fn listar_movimentos(&self, item_id: Uuid) -> Result<Vec<EstoqueMovimento>, AppError> {
        let movimentos = sqlx::query_as::<_, EstoqueMovimento>(
            "SELECT * FROM estoque_movimentos WHERE estoque_item_id = $1 ORDER BY created_at DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movimentos)
    }

    async fn saldo_livro(&self, item_id: Uuid) -> Result<Decimal, AppError> {
        let saldo = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN tipo = 'entrada' THEN quantidade ELSE -quantidade END), 0)
            FROM estoque_movimentos
            WHERE estoque_item_id = $1
            "#,
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(saldo)
    }
}
