// src/services/relatorio_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FerramentaRepository, MovimentacaoRepository},
    models::{
        ferramenta::{Ferramenta, Situacao},
        movimentacao::Movimentacao,
        obra::Obra,
        relatorio::{GrupoSituacao, LinhaRelatorio, RelatorioFerramentas, RetiradaAberta, SubgrupoNome},
    },
};

pub const GRUPO_OUTROS: &str = "Outros";

#[derive(Clone)]
pub struct RelatorioService {
    ferramentas: Arc<dyn FerramentaRepository>,
    movimentacoes: Arc<dyn MovimentacaoRepository>,
}

impl RelatorioService {
    pub fn new(
        ferramentas: Arc<dyn FerramentaRepository>,
        movimentacoes: Arc<dyn MovimentacaoRepository>,
    ) -> Self {
        Self {
            ferramentas,
            movimentacoes,
        }
    }

    pub async fn gerar(&self, obra: Obra) -> Result<RelatorioFerramentas, AppError> {
        let ferramentas = self.ferramentas.listar(obra).await?;
        let abertas = self.movimentacoes.listar_abertas(obra).await?;
        let agora = Utc::now();

        let relatorio = RelatorioFerramentas {
            obra,
            gerado_em: agora,
            total: ferramentas.len(),
            grupos: agrupar_por_situacao(&ferramentas, &abertas, agora),
        };
        tracing::debug!(obra = %obra, total = relatorio.total, "Relatório de ferramentas gerado");
        Ok(relatorio)
    }
}

/// Chave de comparação: sem espaços nas pontas, minúscula e sem acentos.
pub fn chave_ordenacao(texto: &str) -> String {
    texto
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            outro => outro,
        })
        .collect()
}

/// Retirada aberta mais recente de cada ferramenta em uso.
///
/// Registros antigos sem `ferramenta_id` casam por patrimônio e obra, com
/// todas as ferramentas em uso que tenham esse patrimônio.
fn retiradas_por_ferramenta<'a>(
    ferramentas: &[Ferramenta],
    abertas: &'a [Movimentacao],
) -> HashMap<Uuid, &'a Movimentacao> {
    let mut mapa: HashMap<Uuid, &'a Movimentacao> = HashMap::new();
    let em_uso: Vec<&Ferramenta> = ferramentas
        .iter()
        .filter(|f| f.situacao == Situacao::EmUso)
        .collect();

    for m in abertas.iter().filter(|m| m.is_aberta()) {
        let alvos = em_uso.iter().filter(|f| match m.ferramenta_id {
            Some(id) => f.id == id,
            None => f.obra == m.obra && f.patrimonio == m.patrimonio,
        });

        for f in alvos {
            match mapa.get(&f.id) {
                Some(atual) if atual.data_retirada >= m.data_retirada => {}
                _ => {
                    mapa.insert(f.id, m);
                }
            }
        }
    }
    mapa
}

/// Agrupa as ferramentas por situação e, dentro de cada grupo, por nome.
///
/// Os quatro grupos conhecidos aparecem sempre, na ordem fixa. "Outros" só
/// aparece quando há alguma ferramenta nele.
pub fn agrupar_por_situacao(
    ferramentas: &[Ferramenta],
    abertas: &[Movimentacao],
    agora: DateTime<Utc>,
) -> Vec<GrupoSituacao> {
    let retiradas = retiradas_por_ferramenta(ferramentas, abertas);

    let mut baldes: Vec<(String, Vec<&Ferramenta>)> = Situacao::CONHECIDAS
        .iter()
        .map(|s| (s.as_str().to_string(), Vec::new()))
        .collect();
    let mut outros: Vec<&Ferramenta> = Vec::new();

    for f in ferramentas {
        match Situacao::CONHECIDAS.iter().position(|s| *s == f.situacao) {
            Some(i) => baldes[i].1.push(f),
            None => outros.push(f),
        }
    }
    if !outros.is_empty() {
        baldes.push((GRUPO_OUTROS.to_string(), outros));
    }

    baldes
        .into_iter()
        .map(|(situacao, membros)| GrupoSituacao {
            situacao,
            total: membros.len(),
            subgrupos: subgrupos(&membros, &retiradas, agora),
        })
        .collect()
}

fn subgrupos(
    membros: &[&Ferramenta],
    retiradas: &HashMap<Uuid, &Movimentacao>,
    agora: DateTime<Utc>,
) -> Vec<SubgrupoNome> {
    // chave normalizada -> (nome exibido, ferramentas), na ordem de chegada
    let mut grupos: Vec<(String, String, Vec<&Ferramenta>)> = Vec::new();
    for &f in membros {
        let chave = chave_ordenacao(&f.nome);
        match grupos.iter_mut().find(|(c, _, _)| *c == chave) {
            Some((_, _, lista)) => lista.push(f),
            None => grupos.push((chave, f.nome.trim().to_string(), vec![f])),
        }
    }

    // sort_by é estável: empates mantêm a ordem original
    grupos.sort_by(|a, b| a.0.cmp(&b.0));

    grupos
        .into_iter()
        .map(|(_, nome, mut lista)| {
            lista.sort_by_key(|f| chave_ordenacao(&f.patrimonio));
            SubgrupoNome {
                nome,
                total: lista.len(),
                ferramentas: lista
                    .into_iter()
                    .map(|f| LinhaRelatorio {
                        ferramenta: f.clone(),
                        retirada: retiradas
                            .get(&f.id)
                            .filter(|_| f.situacao == Situacao::EmUso)
                            .map(|m| RetiradaAberta {
                                colaborador: m.colaborador.clone(),
                                data_retirada: m.data_retirada,
                                data_prevista: m.data_prevista,
                                status: m.status_em(agora),
                            }),
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::movimentacao::StatusMovimentacao;
    use crate::services::ferramenta_service::tests::ferramenta;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn retirada(f: &Ferramenta, colaborador: &str, quando: DateTime<Utc>) -> Movimentacao {
        Movimentacao {
            id: Uuid::new_v4(),
            ferramenta_id: Some(f.id),
            colaborador: colaborador.into(),
            ferramenta: f.nome.clone(),
            patrimonio: f.patrimonio.clone(),
            obra: f.obra,
            data_retirada: quando,
            data_prevista: None,
            data_devolucao: None,
        }
    }

    fn nomes_dos_grupos(grupos: &[GrupoSituacao]) -> Vec<&str> {
        grupos.iter().map(|g| g.situacao.as_str()).collect()
    }

    #[test]
    fn known_buckets_are_always_present_in_fixed_order() {
        let ferramentas = vec![ferramenta("Serra", "P-1", Situacao::ComDefeito, Obra::Masters)];
        let grupos = agrupar_por_situacao(&ferramentas, &[], Utc::now());

        assert_eq!(
            nomes_dos_grupos(&grupos),
            vec!["Funcionando", "Em uso", "Com defeito", "Em manutenção"]
        );
        assert_eq!(grupos[0].total, 0);
        assert!(grupos[0].subgrupos.is_empty());
        assert_eq!(grupos[2].total, 1);
    }

    #[test]
    fn unknown_situations_fall_into_trailing_outros() {
        let ferramentas = vec![
            ferramenta("Trena", "P-2", Situacao::Outro("Emprestada".into()), Obra::Masters),
            ferramenta("Trena", "P-1", Situacao::Funcionando, Obra::Masters),
        ];
        let grupos = agrupar_por_situacao(&ferramentas, &[], Utc::now());

        assert_eq!(grupos.len(), 5);
        assert_eq!(grupos[4].situacao, GRUPO_OUTROS);
        assert_eq!(grupos[4].total, 1);
    }

    #[test]
    fn subgroups_are_case_and_accent_insensitive_and_sorted() {
        let ferramentas = vec![
            ferramenta("Martelo", "P-9", Situacao::Funcionando, Obra::Honda),
            ferramenta("esmerilhadeira", "P-5", Situacao::Funcionando, Obra::Honda),
            ferramenta(" Éscada ", "P-3", Situacao::Funcionando, Obra::Honda),
            ferramenta("martelo", "P-2", Situacao::Funcionando, Obra::Honda),
            ferramenta("escada", "P-1", Situacao::Funcionando, Obra::Honda),
        ];
        let grupos = agrupar_por_situacao(&ferramentas, &[], Utc::now());
        let funcionando = &grupos[0];

        let nomes: Vec<&str> = funcionando.subgrupos.iter().map(|s| s.nome.as_str()).collect();
        assert_eq!(nomes, vec!["Éscada", "esmerilhadeira", "Martelo"]);

        let escadas: Vec<&str> = funcionando.subgrupos[0]
            .ferramentas
            .iter()
            .map(|l| l.ferramenta.patrimonio.as_str())
            .collect();
        assert_eq!(escadas, vec!["P-1", "P-3"]);
        assert_eq!(funcionando.subgrupos[2].total, 2);
        assert_eq!(funcionando.total, 5);
    }

    #[test]
    fn ties_keep_fetch_order() {
        let a = ferramenta("Nível", "X", Situacao::Funcionando, Obra::Masters);
        let b = ferramenta("Nivel", "x", Situacao::Funcionando, Obra::Masters);
        let grupos = agrupar_por_situacao(&[a.clone(), b.clone()], &[], Utc::now());

        let sub = &grupos[0].subgrupos;
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].nome, "Nível");
        assert_eq!(sub[0].ferramentas[0].ferramenta.id, a.id);
        assert_eq!(sub[0].ferramentas[1].ferramenta.id, b.id);
    }

    #[test]
    fn in_use_tools_carry_latest_open_checkout() {
        let f = ferramenta("Furadeira", "PAT-01", Situacao::EmUso, Obra::Masters);
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

        let antiga = retirada(&f, "Pedro", base);
        let mut recente = retirada(&f, "João", base + Duration::days(2));
        recente.data_prevista = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());

        let grupos = agrupar_por_situacao(&[f], &[recente, antiga], Utc::now());
        let linha = &grupos[1].subgrupos[0].ferramentas[0];
        let info = linha.retirada.as_ref().unwrap();

        assert_eq!(info.colaborador, "João");
        assert_eq!(info.status, StatusMovimentacao::Atrasada);
    }

    #[test]
    fn legacy_checkout_matches_by_patrimonio_and_obra() {
        let f = ferramenta("Betoneira", "B-7", Situacao::EmUso, Obra::Honda);
        let mut legado = retirada(&f, "Ana", Utc::now());
        legado.ferramenta_id = None;

        let mut outra_obra = legado.clone();
        outra_obra.obra = Obra::Masters;
        outra_obra.colaborador = "Beto".into();

        let grupos = agrupar_por_situacao(&[f], &[outra_obra, legado], Utc::now());
        let info = grupos[1].subgrupos[0].ferramentas[0].retirada.as_ref().unwrap();
        assert_eq!(info.colaborador, "Ana");
    }

    #[test]
    fn legacy_checkout_only_attaches_to_in_use_tools() {
        let alicate = ferramenta("Alicate", "X-1", Situacao::Funcionando, Obra::Masters);
        let broca = ferramenta("Broca", "X-1", Situacao::EmUso, Obra::Masters);
        let chave = ferramenta("Chave", "X-1", Situacao::EmUso, Obra::Masters);
        let mut legado = retirada(&broca, "Carla", Utc::now());
        legado.ferramenta_id = None;

        let grupos = agrupar_por_situacao(
            &[alicate.clone(), broca.clone(), chave.clone()],
            &[legado],
            Utc::now(),
        );

        let funcionando = &grupos[0].subgrupos[0].ferramentas[0];
        assert_eq!(funcionando.ferramenta.id, alicate.id);
        assert!(funcionando.retirada.is_none());

        let em_uso: Vec<&LinhaRelatorio> = grupos[1]
            .subgrupos
            .iter()
            .flat_map(|s| s.ferramentas.iter())
            .collect();
        assert_eq!(em_uso.len(), 2);
        for linha in em_uso {
            assert_eq!(linha.retirada.as_ref().unwrap().colaborador, "Carla");
        }
    }

    #[test]
    fn checkout_by_id_is_ignored_when_tool_is_not_in_use() {
        let f = ferramenta("Serra", "S-3", Situacao::ComDefeito, Obra::Honda);
        let aberta = retirada(&f, "Davi", Utc::now());

        let grupos = agrupar_por_situacao(&[f], &[aberta], Utc::now());
        assert!(grupos[2].subgrupos[0].ferramentas[0].retirada.is_none());
    }

    #[test]
    fn grouping_is_idempotent() {
        let ferramentas = vec![
            ferramenta("Alicate", "A-2", Situacao::EmManutencao, Obra::Masters),
            ferramenta("alicate", "A-1", Situacao::EmManutencao, Obra::Masters),
            ferramenta("Broca", "B-1", Situacao::Outro("Perdida".into()), Obra::Masters),
        ];
        let agora = Utc::now();
        let primeira = agrupar_por_situacao(&ferramentas, &[], agora);
        let segunda = agrupar_por_situacao(&ferramentas, &[], agora);
        assert_eq!(primeira, segunda);

        let total: usize = primeira.iter().map(|g| g.total).sum();
        assert_eq!(total, ferramentas.len());
    }

    #[test]
    fn sort_key_folds_case_and_accents() {
        assert_eq!(chave_ordenacao("  Manutenção "), "manutencao");
        assert_eq!(chave_ordenacao("ÁGUA"), "agua");
    }
}
