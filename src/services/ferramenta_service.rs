// src/services/ferramenta_service.rs

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FerramentaRepository, MovimentacaoRepository},
    models::{
        evento::{Acao, Tabela},
        ferramenta::{
            data_manutencao_para, AtualizacaoFerramenta, Ferramenta, Gatilho, NovaFerramenta,
            Situacao,
        },
        movimentacao::{MovimentacaoComStatus, NovaRetirada, StatusMovimentacao},
        obra::Obra,
    },
    services::eventos::Notificador,
};

/// Campos editáveis de uma ferramenta, como chegam do formulário.
#[derive(Debug, Clone)]
pub struct DadosFerramenta {
    pub nome: String,
    pub patrimonio: String,
    pub situacao: Option<Situacao>,
    pub data_manutencao: Option<NaiveDate>,
}

/// Coordena o ciclo de vida das ferramentas: cadastro, retirada e devolução.
#[derive(Clone)]
pub struct FerramentaService {
    ferramentas: Arc<dyn FerramentaRepository>,
    movimentacoes: Arc<dyn MovimentacaoRepository>,
    notificador: Notificador,
}

impl FerramentaService {
    pub fn new(
        ferramentas: Arc<dyn FerramentaRepository>,
        movimentacoes: Arc<dyn MovimentacaoRepository>,
        notificador: Notificador,
    ) -> Self {
        Self {
            ferramentas,
            movimentacoes,
            notificador,
        }
    }

    // --- CADASTRO ---

    pub async fn listar_ferramentas(&self, obra: Obra) -> Result<Vec<Ferramenta>, AppError> {
        self.ferramentas.listar(obra).await
    }

    pub async fn buscar_ferramenta(&self, obra: Obra, id: Uuid) -> Result<Ferramenta, AppError> {
        self.ferramentas
            .buscar(obra, id)
            .await?
            .ok_or(AppError::NaoEncontrado("Ferramenta"))
    }

    pub async fn criar_ferramenta(
        &self,
        obra: Obra,
        dados: DadosFerramenta,
    ) -> Result<Ferramenta, AppError> {
        let (nome, patrimonio) = identificacao(&dados)?;
        let situacao = dados.situacao.unwrap_or(Situacao::Funcionando);

        // Uma ferramenta nova não tem retirada, então não pode nascer "Em uso"
        if situacao == Situacao::EmUso || !situacao.is_conhecida() {
            return Err(AppError::Validacao(format!(
                "Situação inicial inválida: '{}'",
                situacao
            )));
        }

        let nova = NovaFerramenta {
            nome,
            patrimonio,
            data_manutencao: data_manutencao_para(&situacao, dados.data_manutencao),
            situacao,
            obra,
        };

        let ferramenta = self.ferramentas.criar(nova).await?;
        tracing::info!(
            id = %ferramenta.id,
            patrimonio = %ferramenta.patrimonio,
            obra = %obra,
            "Ferramenta cadastrada"
        );
        self.notificador.publicar(Some(obra), Tabela::Ferramentas, Acao::Insert);
        Ok(ferramenta)
    }

    pub async fn atualizar_ferramenta(
        &self,
        obra: Obra,
        id: Uuid,
        dados: DadosFerramenta,
    ) -> Result<Ferramenta, AppError> {
        let atual = self.buscar_ferramenta(obra, id).await?;
        let (nome, patrimonio) = identificacao(&dados)?;

        let destino = dados.situacao.unwrap_or_else(|| atual.situacao.clone());
        let situacao = atual.situacao.transicionar(&Gatilho::Edicao(destino))?;

        let dados = AtualizacaoFerramenta {
            nome,
            patrimonio,
            data_manutencao: data_manutencao_para(&situacao, dados.data_manutencao),
            situacao,
        };

        let ferramenta = self
            .ferramentas
            .atualizar(obra, id, dados)
            .await?
            .ok_or(AppError::NaoEncontrado("Ferramenta"))?;

        tracing::info!(id = %id, situacao = %ferramenta.situacao, "Ferramenta atualizada");
        self.notificador.publicar(Some(obra), Tabela::Ferramentas, Acao::Update);
        Ok(ferramenta)
    }

    pub async fn excluir_ferramenta(&self, obra: Obra, id: Uuid) -> Result<(), AppError> {
        let atual = self.buscar_ferramenta(obra, id).await?;

        if self.movimentacoes.possui_aberta(id).await? {
            return Err(AppError::FerramentaJaRetirada(atual.patrimonio));
        }

        if !self.ferramentas.excluir(obra, id).await? {
            return Err(AppError::NaoEncontrado("Ferramenta"));
        }

        tracing::info!(id = %id, patrimonio = %atual.patrimonio, "Ferramenta excluída");
        self.notificador.publicar(Some(obra), Tabela::Ferramentas, Acao::Delete);
        Ok(())
    }

    // --- RETIRADA / DEVOLUÇÃO ---

    pub async fn registrar_retirada(
        &self,
        obra: Obra,
        ferramenta_id: Uuid,
        colaborador: &str,
        data_prevista: Option<DateTime<Utc>>,
    ) -> Result<MovimentacaoComStatus, AppError> {
        let colaborador = colaborador.trim();
        if colaborador.is_empty() {
            return Err(AppError::Validacao("Informe o colaborador.".into()));
        }

        let ferramenta = self.buscar_ferramenta(obra, ferramenta_id).await?;
        if ferramenta.situacao == Situacao::EmUso {
            return Err(AppError::FerramentaJaRetirada(ferramenta.patrimonio));
        }
        ferramenta.situacao.transicionar(&Gatilho::Retirada)?;

        let agora = Utc::now();
        let nova = NovaRetirada {
            ferramenta_id,
            colaborador: colaborador.to_string(),
            data_prevista,
            data_retirada: agora,
        };

        let movimentacao = self.movimentacoes.registrar_retirada(nova).await.inspect_err(|e| {
            tracing::warn!(ferramenta = %ferramenta_id, "Retirada recusada: {}", e);
        })?;

        tracing::info!(
            movimentacao = %movimentacao.id,
            patrimonio = %movimentacao.patrimonio,
            colaborador = %movimentacao.colaborador,
            "Retirada registrada"
        );
        self.notificador.publicar(Some(obra), Tabela::Movimentacoes, Acao::Insert);
        self.notificador.publicar(Some(obra), Tabela::Ferramentas, Acao::Update);

        Ok(MovimentacaoComStatus::em(movimentacao, agora))
    }

    pub async fn registrar_devolucao(
        &self,
        obra: Obra,
        movimentacao_id: Uuid,
    ) -> Result<MovimentacaoComStatus, AppError> {
        let atual = self
            .movimentacoes
            .buscar(obra, movimentacao_id)
            .await?
            .ok_or(AppError::NaoEncontrado("Movimentação"))?;

        if !atual.is_aberta() {
            return Err(AppError::MovimentacaoJaDevolvida);
        }

        let agora = Utc::now();
        let movimentacao = self
            .movimentacoes
            .registrar_devolucao(obra, movimentacao_id, agora)
            .await?;

        tracing::info!(
            movimentacao = %movimentacao.id,
            patrimonio = %movimentacao.patrimonio,
            "Devolução registrada"
        );
        self.notificador.publicar(Some(obra), Tabela::Movimentacoes, Acao::Update);
        self.notificador.publicar(Some(obra), Tabela::Ferramentas, Acao::Update);

        Ok(MovimentacaoComStatus::em(movimentacao, agora))
    }

    /// Movimentações da obra, mais recentes primeiro, com o status calculado agora.
    pub async fn listar_movimentacoes(
        &self,
        obra: Obra,
        filtro: Option<StatusMovimentacao>,
    ) -> Result<Vec<MovimentacaoComStatus>, AppError> {
        let agora = Utc::now();
        let movimentacoes = self.movimentacoes.listar(obra).await?;

        Ok(movimentacoes
            .into_iter()
            .map(|m| MovimentacaoComStatus::em(m, agora))
            .filter(|m| filtro.is_none_or(|status| m.status == status))
            .collect())
    }

    /// Retiradas ainda sem devolução, atrasadas ou não.
    pub async fn listar_abertas(&self, obra: Obra) -> Result<Vec<MovimentacaoComStatus>, AppError> {
        let agora = Utc::now();
        Ok(self
            .movimentacoes
            .listar_abertas(obra)
            .await?
            .into_iter()
            .map(|m| MovimentacaoComStatus::em(m, agora))
            .collect())
    }
}

fn identificacao(dados: &DadosFerramenta) -> Result<(String, String), AppError> {
    let nome = dados.nome.trim();
    let patrimonio = dados.patrimonio.trim();
    if nome.is_empty() || patrimonio.is_empty() {
        return Err(AppError::Validacao(
            "Nome e patrimônio são obrigatórios.".into(),
        ));
    }
    Ok((nome.to_string(), patrimonio.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::movimentacao::Movimentacao;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    // Banco em memória com a mesma semântica transacional do Postgres
    #[derive(Default)]
    pub(crate) struct BancoMemoria {
        pub ferramentas: Mutex<Vec<Ferramenta>>,
        pub movimentacoes: Mutex<Vec<Movimentacao>>,
    }

    #[async_trait]
    impl FerramentaRepository for BancoMemoria {
        async fn listar(&self, obra: Obra) -> Result<Vec<Ferramenta>, AppError> {
            let ferramentas = self.ferramentas.lock().unwrap();
            Ok(ferramentas.iter().filter(|f| f.obra == obra).cloned().collect())
        }

        async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Option<Ferramenta>, AppError> {
            let ferramentas = self.ferramentas.lock().unwrap();
            Ok(ferramentas.iter().find(|f| f.id == id && f.obra == obra).cloned())
        }

        async fn criar(&self, nova: NovaFerramenta) -> Result<Ferramenta, AppError> {
            let agora = Utc::now();
            let ferramenta = Ferramenta {
                id: Uuid::new_v4(),
                nome: nova.nome,
                patrimonio: nova.patrimonio,
                situacao: nova.situacao,
                obra: nova.obra,
                data_manutencao: nova.data_manutencao,
                created_at: agora,
                updated_at: agora,
            };
            self.ferramentas.lock().unwrap().push(ferramenta.clone());
            Ok(ferramenta)
        }

        async fn atualizar(
            &self,
            obra: Obra,
            id: Uuid,
            dados: AtualizacaoFerramenta,
        ) -> Result<Option<Ferramenta>, AppError> {
            let mut ferramentas = self.ferramentas.lock().unwrap();
            Ok(ferramentas
                .iter_mut()
                .find(|f| f.id == id && f.obra == obra)
                .map(|f| {
                    f.nome = dados.nome;
                    f.patrimonio = dados.patrimonio;
                    f.situacao = dados.situacao;
                    f.data_manutencao = dados.data_manutencao;
                    f.clone()
                }))
        }

        async fn excluir(&self, obra: Obra, id: Uuid) -> Result<bool, AppError> {
            let mut ferramentas = self.ferramentas.lock().unwrap();
            let antes = ferramentas.len();
            ferramentas.retain(|f| !(f.id == id && f.obra == obra));
            let removida = ferramentas.len() < antes;
            if removida {
                for m in self.movimentacoes.lock().unwrap().iter_mut() {
                    if m.ferramenta_id == Some(id) {
                        m.ferramenta_id = None;
                    }
                }
            }
            Ok(removida)
        }
    }

    #[async_trait]
    impl MovimentacaoRepository for BancoMemoria {
        async fn listar(&self, obra: Obra) -> Result<Vec<Movimentacao>, AppError> {
            let mut lista: Vec<_> = self
                .movimentacoes
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.obra == obra)
                .cloned()
                .collect();
            lista.sort_by(|a, b| b.data_retirada.cmp(&a.data_retirada));
            Ok(lista)
        }

        async fn listar_abertas(&self, obra: Obra) -> Result<Vec<Movimentacao>, AppError> {
            let lista = MovimentacaoRepository::listar(self, obra).await?;
            Ok(lista.into_iter().filter(|m| m.is_aberta()).collect())
        }

        async fn buscar(&self, obra: Obra, id: Uuid) -> Result<Option<Movimentacao>, AppError> {
            let movimentacoes = self.movimentacoes.lock().unwrap();
            Ok(movimentacoes.iter().find(|m| m.id == id && m.obra == obra).cloned())
        }

        async fn possui_aberta(&self, ferramenta_id: Uuid) -> Result<bool, AppError> {
            let movimentacoes = self.movimentacoes.lock().unwrap();
            Ok(movimentacoes
                .iter()
                .any(|m| m.ferramenta_id == Some(ferramenta_id) && m.is_aberta()))
        }

        async fn registrar_retirada(&self, nova: NovaRetirada) -> Result<Movimentacao, AppError> {
            let mut ferramentas = self.ferramentas.lock().unwrap();
            let mut movimentacoes = self.movimentacoes.lock().unwrap();

            let ferramenta = ferramentas
                .iter_mut()
                .find(|f| f.id == nova.ferramenta_id)
                .ok_or(AppError::NaoEncontrado("Ferramenta"))?;
            if movimentacoes
                .iter()
                .any(|m| m.ferramenta_id == Some(ferramenta.id) && m.is_aberta())
            {
                return Err(AppError::FerramentaJaRetirada(ferramenta.patrimonio.clone()));
            }
            ferramenta.situacao = ferramenta.situacao.transicionar(&Gatilho::Retirada)?;
            ferramenta.data_manutencao = None;

            let movimentacao = Movimentacao {
                id: Uuid::new_v4(),
                ferramenta_id: Some(ferramenta.id),
                colaborador: nova.colaborador,
                ferramenta: ferramenta.nome.clone(),
                patrimonio: ferramenta.patrimonio.clone(),
                obra: ferramenta.obra,
                data_retirada: nova.data_retirada,
                data_prevista: nova.data_prevista,
                data_devolucao: None,
            };
            movimentacoes.push(movimentacao.clone());
            Ok(movimentacao)
        }

        async fn registrar_devolucao(
            &self,
            obra: Obra,
            id: Uuid,
            data_devolucao: DateTime<Utc>,
        ) -> Result<Movimentacao, AppError> {
            let mut ferramentas = self.ferramentas.lock().unwrap();
            let mut movimentacoes = self.movimentacoes.lock().unwrap();

            let movimentacao = movimentacoes
                .iter_mut()
                .find(|m| m.id == id && m.obra == obra)
                .ok_or(AppError::NaoEncontrado("Movimentação"))?;
            if !movimentacao.is_aberta() {
                return Err(AppError::MovimentacaoJaDevolvida);
            }
            let orfa = movimentacao
                .ferramenta_id
                .is_some_and(|fid| !ferramentas.iter().any(|f| f.id == fid));
            if orfa {
                return Err(AppError::EstadoInconsistente(format!(
                    "movimentação {} aponta para uma ferramenta inexistente",
                    id
                )));
            }
            movimentacao.data_devolucao = Some(data_devolucao);

            for f in ferramentas.iter_mut() {
                let casa = match movimentacao.ferramenta_id {
                    Some(fid) => f.id == fid,
                    None => {
                        f.obra == movimentacao.obra
                            && f.patrimonio == movimentacao.patrimonio
                            && f.situacao == Situacao::EmUso
                    }
                };
                if casa {
                    f.situacao = Situacao::Funcionando;
                }
            }
            Ok(movimentacao.clone())
        }
    }

    pub(crate) fn ferramenta(nome: &str, patrimonio: &str, situacao: Situacao, obra: Obra) -> Ferramenta {
        let criada = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        Ferramenta {
            id: Uuid::new_v4(),
            nome: nome.into(),
            patrimonio: patrimonio.into(),
            situacao,
            obra,
            data_manutencao: None,
            created_at: criada,
            updated_at: criada,
        }
    }

    fn servico(banco: Arc<BancoMemoria>) -> FerramentaService {
        FerramentaService::new(banco.clone(), banco, Notificador::new(16))
    }

    fn banco_com(ferramentas: Vec<Ferramenta>) -> Arc<BancoMemoria> {
        let banco = BancoMemoria::default();
        *banco.ferramentas.lock().unwrap() = ferramentas;
        Arc::new(banco)
    }

    #[tokio::test]
    async fn checkout_creates_open_movement_and_marks_tool_in_use() {
        let furadeira = ferramenta("Furadeira", "PAT-01", Situacao::Funcionando, Obra::Masters);
        let id = furadeira.id;
        let banco = banco_com(vec![furadeira]);
        let service = servico(banco.clone());

        let retirada = service
            .registrar_retirada(Obra::Masters, id, "João", None)
            .await
            .unwrap();

        assert_eq!(retirada.status, StatusMovimentacao::EmAberto);
        let m = &retirada.movimentacao;
        assert_eq!(m.ferramenta, "Furadeira");
        assert_eq!(m.patrimonio, "PAT-01");
        assert_eq!(m.obra, Obra::Masters);
        assert_eq!(m.ferramenta_id, Some(id));
        assert_eq!(m.data_devolucao, None);

        assert_eq!(banco.movimentacoes.lock().unwrap().len(), 1);
        let f = service.buscar_ferramenta(Obra::Masters, id).await.unwrap();
        assert_eq!(f.situacao, Situacao::EmUso);
    }

    #[tokio::test]
    async fn return_closes_movement_and_frees_tool() {
        let f = ferramenta("Esmerilhadeira", "PAT-02", Situacao::Funcionando, Obra::Honda);
        let id = f.id;
        let service = servico(banco_com(vec![f]));

        let retirada = service
            .registrar_retirada(Obra::Honda, id, "Maria", None)
            .await
            .unwrap();
        let devolvida = service
            .registrar_devolucao(Obra::Honda, retirada.movimentacao.id)
            .await
            .unwrap();

        assert_eq!(devolvida.status, StatusMovimentacao::Devolvida);
        assert!(devolvida.movimentacao.data_devolucao.is_some());
        let f = service.buscar_ferramenta(Obra::Honda, id).await.unwrap();
        assert_eq!(f.situacao, Situacao::Funcionando);
    }

    fn retirada_legada(patrimonio: &str, obra: Obra) -> Movimentacao {
        Movimentacao {
            id: Uuid::new_v4(),
            ferramenta_id: None,
            colaborador: "Rui".into(),
            ferramenta: "Andaime".into(),
            patrimonio: patrimonio.into(),
            obra,
            data_retirada: Utc.with_ymd_and_hms(2024, 11, 4, 7, 30, 0).unwrap(),
            data_prevista: None,
            data_devolucao: None,
        }
    }

    #[tokio::test]
    async fn legacy_return_frees_every_in_use_tool_with_that_patrimonio() {
        let a = ferramenta("Andaime", "AND-1", Situacao::EmUso, Obra::Masters);
        let b = ferramenta("Andaime tubular", "AND-1", Situacao::EmUso, Obra::Masters);
        let outra_obra = ferramenta("Andaime", "AND-1", Situacao::EmUso, Obra::Honda);
        let defeituosa = ferramenta("Andaime", "AND-1", Situacao::ComDefeito, Obra::Masters);
        let ids = [a.id, b.id, outra_obra.id, defeituosa.id];

        let banco = banco_com(vec![a, b, outra_obra, defeituosa]);
        let legado = retirada_legada("AND-1", Obra::Masters);
        let legado_id = legado.id;
        banco.movimentacoes.lock().unwrap().push(legado);
        let service = servico(banco.clone());

        let devolvida = service.registrar_devolucao(Obra::Masters, legado_id).await.unwrap();
        assert_eq!(devolvida.status, StatusMovimentacao::Devolvida);

        let situacoes: Vec<Situacao> = {
            let ferramentas = banco.ferramentas.lock().unwrap();
            ids.iter()
                .map(|id| ferramentas.iter().find(|f| f.id == *id).unwrap().situacao.clone())
                .collect()
        };
        assert_eq!(
            situacoes,
            vec![
                Situacao::Funcionando,
                Situacao::Funcionando,
                Situacao::EmUso,
                Situacao::ComDefeito,
            ]
        );
    }

    #[tokio::test]
    async fn return_pointing_at_missing_tool_is_inconsistent_and_stays_open() {
        let banco = banco_com(vec![]);
        let mut orfa = retirada_legada("ORF-1", Obra::Honda);
        orfa.ferramenta_id = Some(Uuid::new_v4());
        let orfa_id = orfa.id;
        banco.movimentacoes.lock().unwrap().push(orfa);
        let service = servico(banco.clone());

        let err = service.registrar_devolucao(Obra::Honda, orfa_id).await.unwrap_err();
        assert!(matches!(err, AppError::EstadoInconsistente(_)));
        assert!(banco.movimentacoes.lock().unwrap()[0].is_aberta());
    }

    #[tokio::test]
    async fn second_return_is_rejected() {
        let f = ferramenta("Serra", "PAT-03", Situacao::Funcionando, Obra::Masters);
        let id = f.id;
        let service = servico(banco_com(vec![f]));

        let mov = service
            .registrar_retirada(Obra::Masters, id, "Ana", None)
            .await
            .unwrap();
        service.registrar_devolucao(Obra::Masters, mov.movimentacao.id).await.unwrap();

        let err = service
            .registrar_devolucao(Obra::Masters, mov.movimentacao.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MovimentacaoJaDevolvida));
    }

    #[tokio::test]
    async fn blank_borrower_is_rejected_before_any_write() {
        let f = ferramenta("Trena", "PAT-04", Situacao::Funcionando, Obra::Masters);
        let id = f.id;
        let banco = banco_com(vec![f]);
        let service = servico(banco.clone());

        let err = service
            .registrar_retirada(Obra::Masters, id, "   ", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validacao(_)));
        assert!(banco.movimentacoes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tool_already_in_use_cannot_be_checked_out_again() {
        let f = ferramenta("Martelete", "PAT-05", Situacao::Funcionando, Obra::Honda);
        let id = f.id;
        let banco = banco_com(vec![f]);
        let service = servico(banco.clone());

        service.registrar_retirada(Obra::Honda, id, "Pedro", None).await.unwrap();
        let err = service
            .registrar_retirada(Obra::Honda, id, "Paulo", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FerramentaJaRetirada(p) if p == "PAT-05"));
        assert_eq!(banco.movimentacoes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tool_in_maintenance_cannot_be_checked_out() {
        let f = ferramenta("Gerador", "PAT-06", Situacao::EmManutencao, Obra::Masters);
        let id = f.id;
        let service = servico(banco_com(vec![f]));

        let err = service
            .registrar_retirada(Obra::Masters, id, "João", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TransicaoInvalida { .. }));
    }

    #[tokio::test]
    async fn tools_of_another_obra_are_not_found() {
        let f = ferramenta("Nível", "PAT-07", Situacao::Funcionando, Obra::Honda);
        let id = f.id;
        let service = servico(banco_com(vec![f]));

        let err = service
            .registrar_retirada(Obra::Masters, id, "João", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NaoEncontrado(_)));
    }

    #[tokio::test]
    async fn movement_filter_uses_derived_status() {
        let a = ferramenta("Furadeira", "PAT-10", Situacao::Funcionando, Obra::Masters);
        let b = ferramenta("Furadeira", "PAT-11", Situacao::Funcionando, Obra::Masters);
        let (ida, idb) = (a.id, b.id);
        let service = servico(banco_com(vec![a, b]));

        let vencida = Utc::now() - Duration::days(2);
        service.registrar_retirada(Obra::Masters, ida, "João", Some(vencida)).await.unwrap();
        service.registrar_retirada(Obra::Masters, idb, "José", None).await.unwrap();

        let atrasadas = service
            .listar_movimentacoes(Obra::Masters, Some(StatusMovimentacao::Atrasada))
            .await
            .unwrap();
        assert_eq!(atrasadas.len(), 1);
        assert_eq!(atrasadas[0].movimentacao.patrimonio, "PAT-10");

        let todas = service.listar_movimentacoes(Obra::Masters, None).await.unwrap();
        assert_eq!(todas.len(), 2);
    }

    #[tokio::test]
    async fn edit_cannot_bypass_the_ledger() {
        let f = ferramenta("Betoneira", "PAT-12", Situacao::Funcionando, Obra::Masters);
        let id = f.id;
        let service = servico(banco_com(vec![f]));

        let dados = DadosFerramenta {
            nome: "Betoneira".into(),
            patrimonio: "PAT-12".into(),
            situacao: Some(Situacao::EmUso),
            data_manutencao: None,
        };
        let err = service.atualizar_ferramenta(Obra::Masters, id, dados).await.unwrap_err();
        assert!(matches!(err, AppError::TransicaoInvalida { .. }));
    }

    #[tokio::test]
    async fn edit_to_maintenance_keeps_the_date_and_leaving_clears_it() {
        let f = ferramenta("Compressor", "PAT-13", Situacao::Funcionando, Obra::Honda);
        let id = f.id;
        let service = servico(banco_com(vec![f]));
        let data = NaiveDate::from_ymd_opt(2026, 10, 20);

        let em_manutencao = service
            .atualizar_ferramenta(
                Obra::Honda,
                id,
                DadosFerramenta {
                    nome: " Compressor ".into(),
                    patrimonio: "PAT-13".into(),
                    situacao: Some(Situacao::EmManutencao),
                    data_manutencao: data,
                },
            )
            .await
            .unwrap();
        assert_eq!(em_manutencao.nome, "Compressor");
        assert_eq!(em_manutencao.data_manutencao, data);

        let consertado = service
            .atualizar_ferramenta(
                Obra::Honda,
                id,
                DadosFerramenta {
                    nome: "Compressor".into(),
                    patrimonio: "PAT-13".into(),
                    situacao: Some(Situacao::Funcionando),
                    data_manutencao: data,
                },
            )
            .await
            .unwrap();
        assert_eq!(consertado.data_manutencao, None);
    }

    #[tokio::test]
    async fn tool_with_open_movement_cannot_be_deleted() {
        let f = ferramenta("Andaime", "PAT-14", Situacao::Funcionando, Obra::Masters);
        let id = f.id;
        let service = servico(banco_com(vec![f]));

        service.registrar_retirada(Obra::Masters, id, "João", None).await.unwrap();
        let err = service.excluir_ferramenta(Obra::Masters, id).await.unwrap_err();
        assert!(matches!(err, AppError::FerramentaJaRetirada(_)));
    }

    #[tokio::test]
    async fn deleting_a_returned_tool_keeps_history() {
        let f = ferramenta("Alicate", "PAT-15", Situacao::Funcionando, Obra::Masters);
        let id = f.id;
        let banco = banco_com(vec![f]);
        let service = servico(banco.clone());

        let mov = service.registrar_retirada(Obra::Masters, id, "João", None).await.unwrap();
        service.registrar_devolucao(Obra::Masters, mov.movimentacao.id).await.unwrap();
        service.excluir_ferramenta(Obra::Masters, id).await.unwrap();

        let historico = banco.movimentacoes.lock().unwrap();
        assert_eq!(historico.len(), 1);
        assert_eq!(historico[0].ferramenta_id, None);
        assert_eq!(historico[0].patrimonio, "PAT-15");
    }

    #[tokio::test]
    async fn new_tool_cannot_start_in_use() {
        let service = servico(banco_com(vec![]));
        let err = service
            .criar_ferramenta(
                Obra::Masters,
                DadosFerramenta {
                    nome: "Furadeira".into(),
                    patrimonio: "PAT-20".into(),
                    situacao: Some(Situacao::EmUso),
                    data_manutencao: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validacao(_)));
    }

    #[tokio::test]
    async fn checkout_publishes_change_events() {
        let f = ferramenta("Furadeira", "PAT-21", Situacao::Funcionando, Obra::Masters);
        let id = f.id;
        let banco = banco_com(vec![f]);
        let notificador = Notificador::new(16);
        let mut rx = notificador.assinar();
        let service = FerramentaService::new(banco.clone(), banco, notificador);

        service.registrar_retirada(Obra::Masters, id, "João", None).await.unwrap();

        let primeiro = rx.recv().await.unwrap();
        let segundo = rx.recv().await.unwrap();
        assert_eq!(primeiro.tabela, Tabela::Movimentacoes);
        assert_eq!(segundo.tabela, Tabela::Ferramentas);
    }

    #[tokio::test]
    async fn repository_errors_propagate_unchanged() {
        let mut ferramentas = crate::db::ferramenta_repo::MockFerramentaRepository::new();
        ferramentas
            .expect_buscar()
            .returning(|_, _| Err(AppError::InternalServerError(anyhow::anyhow!("conexão caiu"))));
        let mut movimentacoes = crate::db::movimentacao_repo::MockMovimentacaoRepository::new();
        movimentacoes.expect_registrar_retirada().never();

        let service = FerramentaService::new(
            Arc::new(ferramentas),
            Arc::new(movimentacoes),
            Notificador::new(1),
        );
        let err = service
            .registrar_retirada(Obra::Masters, Uuid::new_v4(), "João", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }
}
