// src/services/estoque_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::EstoqueRepository,
    models::{
        estoque::{
            AtualizacaoEstoqueItem, Conciliacao, EstoqueItem, EstoqueMovimento,
            MovimentoRegistrado, NovoEstoqueItem, NovoEstoqueMovimento, TipoMovimento,
        },
        evento::{Acao, Tabela},
        obra::Obra,
    },
    services::eventos::Notificador,
};

const ORIGEM_AJUSTE_RAPIDO: &str = "ajuste rápido";

#[derive(Clone)]
pub struct EstoqueService {
    repo: Arc<dyn EstoqueRepository>,
    notificador: Notificador,
}

impl EstoqueService {
    pub fn new(repo: Arc<dyn EstoqueRepository>, notificador: Notificador) -> Self {
        Self { repo, notificador }
    }

    // --- ITENS ---

    pub async fn listar_itens(&self, obra: Obra) -> Result<Vec<EstoqueItem>, AppError> {
        self.repo.listar_itens(obra).await
    }

    pub async fn buscar_item(&self, obra: Obra, id: Uuid) -> Result<EstoqueItem, AppError> {
        self.repo
            .buscar_item(obra, id)
            .await?
            .ok_or(AppError::NaoEncontrado("Item de estoque"))
    }

    pub async fn criar_item(&self, novo: NovoEstoqueItem) -> Result<EstoqueItem, AppError> {
        if novo.quantidade_inicial.is_sign_negative() || novo.minimo.is_sign_negative() {
            return Err(AppError::Validacao(
                "Quantidade e mínimo não podem ser negativos.".into(),
            ));
        }

        let obra = novo.obra;
        let item = self.repo.criar_item(novo).await?;
        tracing::info!(id = %item.id, nome = %item.nome, quantidade = %item.quantidade, "Item de estoque cadastrado");
        self.notificador.publicar(Some(obra), Tabela::EstoqueItens, Acao::Insert);
        Ok(item)
    }

    /// Edita cadastro e mínimo. A quantidade só muda por movimento.
    pub async fn atualizar_item(
        &self,
        obra: Obra,
        id: Uuid,
        dados: AtualizacaoEstoqueItem,
    ) -> Result<EstoqueItem, AppError> {
        if dados.minimo.is_sign_negative() {
            return Err(AppError::Validacao("O mínimo não pode ser negativo.".into()));
        }

        let item = self
            .repo
            .atualizar_item(obra, id, dados)
            .await?
            .ok_or(AppError::NaoEncontrado("Item de estoque"))?;
        self.notificador.publicar(Some(obra), Tabela::EstoqueItens, Acao::Update);
        Ok(item)
    }

    pub async fn excluir_item(&self, obra: Obra, id: Uuid) -> Result<(), AppError> {
        if !self.repo.excluir_item(obra, id).await? {
            return Err(AppError::NaoEncontrado("Item de estoque"));
        }
        tracing::info!(id = %id, "Item de estoque excluído");
        self.notificador.publicar(Some(obra), Tabela::EstoqueItens, Acao::Delete);
        Ok(())
    }

    // --- MOVIMENTOS ---

    /// Registra uma entrada ou saída. Saída maior que o saldo é recusada sem
    /// nenhuma escrita.
    pub async fn registrar_movimento(
        &self,
        obra: Obra,
        novo: NovoEstoqueMovimento,
    ) -> Result<MovimentoRegistrado, AppError> {
        if novo.quantidade <= Decimal::ZERO {
            return Err(AppError::Validacao(
                "A quantidade deve ser maior que zero.".into(),
            ));
        }

        let item = self.buscar_item(obra, novo.estoque_item_id).await?;
        if novo.tipo == TipoMovimento::Saida && novo.quantidade > item.quantidade {
            tracing::warn!(
                item = %item.id,
                disponivel = %item.quantidade,
                solicitado = %novo.quantidade,
                "Saída recusada por falta de saldo"
            );
            return Err(AppError::EstoqueInsuficiente {
                disponivel: item.quantidade,
                solicitado: novo.quantidade,
            });
        }

        let registrado = self.repo.registrar_movimento(obra, novo).await?;

        if registrado.item.abaixo_do_minimo() {
            tracing::warn!(
                item = %registrado.item.id,
                quantidade = %registrado.item.quantidade,
                minimo = %registrado.item.minimo,
                "Item abaixo do estoque mínimo"
            );
        }
        self.notificador.publicar(Some(obra), Tabela::EstoqueMovimentos, Acao::Insert);
        self.notificador.publicar(Some(obra), Tabela::EstoqueItens, Acao::Update);
        Ok(registrado)
    }

    /// Botões de +1 / -1 da tela de estoque.
    pub async fn ajustar_uma_unidade(
        &self,
        obra: Obra,
        item_id: Uuid,
        tipo: TipoMovimento,
        usuario_id: Option<Uuid>,
    ) -> Result<MovimentoRegistrado, AppError> {
        self.registrar_movimento(
            obra,
            NovoEstoqueMovimento {
                estoque_item_id: item_id,
                tipo,
                quantidade: Decimal::ONE,
                usuario_id,
                origem: Some(ORIGEM_AJUSTE_RAPIDO.to_string()),
                observacao: None,
            },
        )
        .await
    }

    pub async fn listar_movimentos(
        &self,
        obra: Obra,
        item_id: Uuid,
    ) -> Result<Vec<EstoqueMovimento>, AppError> {
        // garante que o item é da obra
        self.buscar_item(obra, item_id).await?;
        self.repo.listar_movimentos(item_id).await
    }

    pub async fn conciliar(&self, obra: Obra, item_id: Uuid) -> Result<Conciliacao, AppError> {
        let item = self.buscar_item(obra, item_id).await?;
        let saldo = self.repo.saldo_livro(item_id).await?;
        let conciliacao = Conciliacao::new(&item, saldo);
        if !conciliacao.conciliado {
            tracing::warn!(item = %item_id, divergencia = %conciliacao.divergencia, "Saldo diverge do livro de movimentos");
        }
        Ok(conciliacao)
    }
}
