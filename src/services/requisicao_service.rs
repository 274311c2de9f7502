// src/services/requisicao_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RequisicaoRepository,
    models::{
        evento::{Acao, Tabela},
        obra::Obra,
        requisicao::{NovaRequisicao, NovoRequisicaoItem, Requisicao, StatusRequisicao},
    },
    services::eventos::Notificador,
};

#[derive(Clone)]
pub struct RequisicaoService {
    repo: Arc<dyn RequisicaoRepository>,
    notificador: Notificador,
}

impl RequisicaoService {
    pub fn new(repo: Arc<dyn RequisicaoRepository>, notificador: Notificador) -> Self {
        Self { repo, notificador }
    }

    pub async fn listar(&self, obra: Obra) -> Result<Vec<Requisicao>, AppError> {
        self.repo.listar(obra).await
    }

    pub async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Requisicao, AppError> {
        self.repo
            .buscar(obra, id)
            .await?
            .ok_or(AppError::NaoEncontrado("Requisição"))
    }

    pub async fn criar(&self, nova: NovaRequisicao) -> Result<Requisicao, AppError> {
        let nova = normalizar(nova)?;
        let obra = nova.obra;
        let requisicao = self.repo.criar(nova).await?;

        tracing::info!(
            id = %requisicao.id,
            codigo = %requisicao.codigo,
            itens = requisicao.itens.len(),
            "Requisição criada"
        );
        self.notificador.publicar(Some(obra), Tabela::Requisicoes, Acao::Insert);
        Ok(requisicao)
    }

    pub async fn atualizar_status(
        &self,
        obra: Obra,
        id: Uuid,
        status: StatusRequisicao,
    ) -> Result<Requisicao, AppError> {
        let requisicao = self
            .repo
            .atualizar_status(obra, id, status)
            .await?
            .ok_or(AppError::NaoEncontrado("Requisição"))?;
        tracing::info!(id = %id, ?status, "Status da requisição alterado");
        self.notificador.publicar(Some(obra), Tabela::Requisicoes, Acao::Update);
        Ok(requisicao)
    }

    pub async fn alternar_recebido(
        &self,
        obra: Obra,
        id: Uuid,
        item_id: Uuid,
    ) -> Result<Requisicao, AppError> {
        let requisicao = self
            .repo
            .alternar_recebido(obra, id, item_id)
            .await?
            .ok_or(AppError::NaoEncontrado("Item da requisição"))?;
        self.notificador.publicar(Some(obra), Tabela::Requisicoes, Acao::Update);
        Ok(requisicao)
    }

    pub async fn excluir(&self, obra: Obra, id: Uuid) -> Result<(), AppError> {
        if !self.repo.excluir(obra, id).await? {
            return Err(AppError::NaoEncontrado("Requisição"));
        }
        tracing::info!(id = %id, "Requisição excluída");
        self.notificador.publicar(Some(obra), Tabela::Requisicoes, Acao::Delete);
        Ok(())
    }
}

fn texto_opcional(valor: Option<String>) -> Option<String> {
    valor
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalizar(nova: NovaRequisicao) -> Result<NovaRequisicao, AppError> {
    let codigo = nova.codigo.trim().to_string();
    let solicitante = nova.solicitante.trim().to_string();
    if codigo.is_empty() || solicitante.is_empty() {
        return Err(AppError::Validacao(
            "Código e solicitante são obrigatórios.".into(),
        ));
    }
    if nova.itens.is_empty() {
        return Err(AppError::Validacao(
            "A requisição precisa de pelo menos um item.".into(),
        ));
    }

    let mut itens = Vec::with_capacity(nova.itens.len());
    for (i, item) in nova.itens.into_iter().enumerate() {
        let descricao = item.descricao.trim().to_string();
        if descricao.is_empty() || item.quantidade <= Decimal::ZERO {
            return Err(AppError::Validacao(format!(
                "Item {} precisa de descrição e quantidade maior que zero.",
                i + 1
            )));
        }
        let unidade = match item.unidade.trim() {
            "" => "un".to_string(),
            u => u.to_string(),
        };
        itens.push(NovoRequisicaoItem {
            descricao,
            unidade,
            quantidade: item.quantidade,
        });
    }

    Ok(NovaRequisicao {
        codigo,
        solicitante,
        setor: texto_opcional(nova.setor),
        engenheiro: texto_opcional(nova.engenheiro),
        obra: nova.obra,
        itens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::requisicao_repo::MockRequisicaoRepository;
    use chrono::Utc;

    fn nova(codigo: &str, itens: Vec<NovoRequisicaoItem>) -> NovaRequisicao {
        NovaRequisicao {
            codigo: codigo.into(),
            solicitante: "Carlos".into(),
            setor: Some("  ".into()),
            engenheiro: Some(" Eng. Lúcia ".into()),
            obra: Obra::Honda,
            itens,
        }
    }

    fn item(descricao: &str, quantidade: i64) -> NovoRequisicaoItem {
        NovoRequisicaoItem {
            descricao: descricao.into(),
            unidade: "".into(),
            quantidade: Decimal::from(quantidade),
        }
    }

    #[test]
    fn normalizes_optional_fields_and_units() {
        let n = normalizar(nova(" REQ-1 ", vec![item("Cimento", 10)])).unwrap();
        assert_eq!(n.codigo, "REQ-1");
        assert_eq!(n.setor, None);
        assert_eq!(n.engenheiro.as_deref(), Some("Eng. Lúcia"));
        assert_eq!(n.itens[0].unidade, "un");
    }

    #[test]
    fn requires_items_with_positive_quantity() {
        assert!(matches!(normalizar(nova("REQ-2", vec![])), Err(AppError::Validacao(_))));
        assert!(matches!(
            normalizar(nova("REQ-3", vec![item("Areia", 0)])),
            Err(AppError::Validacao(_))
        ));
    }

    #[tokio::test]
    async fn duplicated_code_is_reported() {
        let mut repo = MockRequisicaoRepository::new();
        repo.expect_criar()
            .returning(|n| Err(AppError::RequisicaoCodigoDuplicado(n.codigo)));

        let service = RequisicaoService::new(Arc::new(repo), Notificador::new(2));
        let err = service
            .criar(nova("REQ-9", vec![item("Brita", 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RequisicaoCodigoDuplicado(c) if c == "REQ-9"));
    }

    #[tokio::test]
    async fn toggling_unknown_item_is_not_found() {
        let mut repo = MockRequisicaoRepository::new();
        repo.expect_alternar_recebido().returning(|_, _, _| Ok(None));

        let service = RequisicaoService::new(Arc::new(repo), Notificador::new(2));
        let err = service
            .alternar_recebido(Obra::Honda, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NaoEncontrado(_)));
    }

    #[tokio::test]
    async fn status_update_returns_refreshed_requisition() {
        let id = Uuid::new_v4();
        let mut repo = MockRequisicaoRepository::new();
        repo.expect_atualizar_status().returning(move |obra, id, status| {
            Ok(Some(Requisicao {
                id,
                codigo: "REQ-4".into(),
                solicitante: "Carlos".into(),
                setor: None,
                engenheiro: None,
                obra,
                status,
                created_at: Utc::now(),
                itens: vec![],
            }))
        });

        let service = RequisicaoService::new(Arc::new(repo), Notificador::new(2));
        let r = service
            .atualizar_status(Obra::Masters, id, StatusRequisicao::Concluida)
            .await
            .unwrap();
        assert_eq!(r.status, StatusRequisicao::Concluida);
        assert_eq!(r.id, id);
    }
}
