// src/services/colaborador_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ColaboradorRepository,
    models::{
        colaborador::Colaborador,
        evento::{Acao, Tabela},
    },
    services::eventos::Notificador,
};

#[derive(Clone)]
pub struct ColaboradorService {
    repo: Arc<dyn ColaboradorRepository>,
    notificador: Notificador,
}

impl ColaboradorService {
    pub fn new(repo: Arc<dyn ColaboradorRepository>, notificador: Notificador) -> Self {
        Self { repo, notificador }
    }

    pub async fn listar(&self) -> Result<Vec<Colaborador>, AppError> {
        self.repo.listar().await
    }

    pub async fn criar(&self, nome: &str) -> Result<Colaborador, AppError> {
        let nome = nome.split_whitespace().collect::<Vec<_>>().join(" ");
        if nome.is_empty() {
            return Err(AppError::Validacao("O nome é obrigatório.".into()));
        }
        let colaborador = self.repo.criar(nome).await?;
        self.notificador.publicar(None, Tabela::Colaboradores, Acao::Insert);
        Ok(colaborador)
    }

    pub async fn excluir(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.excluir(id).await? {
            return Err(AppError::NaoEncontrado("Colaborador"));
        }
        self.notificador.publicar(None, Tabela::Colaboradores, Acao::Delete);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::colaborador_repo::MockColaboradorRepository;
    use chrono::Utc;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn collapses_whitespace_in_names() {
        let mut repo = MockColaboradorRepository::new();
        repo.expect_criar()
            .with(eq("João da Silva".to_string()))
            .returning(|nome| {
                Ok(Colaborador {
                    id: Uuid::new_v4(),
                    nome,
                    created_at: Utc::now(),
                })
            });

        let service = ColaboradorService::new(Arc::new(repo), Notificador::new(2));
        let c = service.criar("  João   da Silva ").await.unwrap();
        assert_eq!(c.nome, "João da Silva");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let mut repo = MockColaboradorRepository::new();
        repo.expect_criar().never();

        let service = ColaboradorService::new(Arc::new(repo), Notificador::new(2));
        assert!(matches!(service.criar("   ").await, Err(AppError::Validacao(_))));
    }
}
