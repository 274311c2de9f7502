// src/services/exportacao.rs
//
// Planilhas CSV no formato que o Excel em português abre direto:
// BOM UTF-8, separador ';' e todos os campos entre aspas.

use chrono::{DateTime, Local, Utc};

use crate::{
    models::{
        estoque::EstoqueItem,
        ferramenta::{Ferramenta, Situacao},
    },
    services::relatorio_service::{chave_ordenacao, GRUPO_OUTROS},
};

const BOM: &str = "\u{FEFF}";
const SEPARADOR: &str = ";";

pub const CABECALHO_FERRAMENTAS: [&str; 6] = [
    "Nome",
    "Patrimônio",
    "Obra",
    "Situação",
    "Data de Manutenção",
    "Atualizado em",
];

pub const CABECALHO_ESTOQUE: [&str; 6] = [
    "Nome",
    "Categoria",
    "Obra",
    "Quantidade",
    "Mínimo",
    "Situação",
];

fn campo(valor: &str) -> String {
    format!("\"{}\"", valor.replace('"', "\"\""))
}

fn linha<S: AsRef<str>>(planilha: &mut String, campos: &[S]) {
    let campos: Vec<String> = campos.iter().map(|c| campo(c.as_ref())).collect();
    planilha.push_str(&campos.join(SEPARADOR));
    planilha.push('\n');
}

fn data_hora(instante: DateTime<Utc>) -> String {
    instante.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()
}

fn abertura(titulo: &str, gerado_em: DateTime<Utc>) -> String {
    let mut planilha = String::from(BOM);
    linha(&mut planilha, &[titulo]);
    linha(&mut planilha, &["Gerado em".to_string(), data_hora(gerado_em)]);
    planilha.push('\n');
    planilha
}

/// Ferramentas de uma ou mais obras, ordenadas por nome e patrimônio.
pub fn csv_ferramentas(ferramentas: &[Ferramenta], gerado_em: DateTime<Utc>) -> String {
    let mut planilha = abertura("Relatório de Ferramentas", gerado_em);
    linha(&mut planilha, &CABECALHO_FERRAMENTAS);

    let mut ordenadas: Vec<&Ferramenta> = ferramentas.iter().collect();
    ordenadas.sort_by_key(|f| (chave_ordenacao(&f.nome), chave_ordenacao(&f.patrimonio)));

    for f in &ordenadas {
        linha(
            &mut planilha,
            &[
                f.nome.clone(),
                f.patrimonio.clone(),
                f.obra.rotulo().to_string(),
                f.situacao.to_string(),
                f.data_manutencao
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_default(),
                data_hora(f.updated_at),
            ],
        );
    }

    planilha.push('\n');
    linha(&mut planilha, &["Resumo"]);
    linha(
        &mut planilha,
        &["Total de Ferramentas".to_string(), ferramentas.len().to_string()],
    );
    for situacao in Situacao::CONHECIDAS.iter() {
        let n = ferramentas.iter().filter(|f| f.situacao == *situacao).count();
        linha(&mut planilha, &[situacao.to_string(), n.to_string()]);
    }
    let outros = ferramentas.iter().filter(|f| !f.situacao.is_conhecida()).count();
    if outros > 0 {
        linha(&mut planilha, &[GRUPO_OUTROS.to_string(), outros.to_string()]);
    }
    planilha
}

pub fn csv_estoque(itens: &[EstoqueItem], gerado_em: DateTime<Utc>) -> String {
    let mut planilha = abertura("Relatório de Estoque", gerado_em);
    linha(&mut planilha, &CABECALHO_ESTOQUE);

    let mut ordenados: Vec<&EstoqueItem> = itens.iter().collect();
    ordenados.sort_by_key(|i| (chave_ordenacao(&i.categoria), chave_ordenacao(&i.nome)));

    for item in &ordenados {
        let situacao = if item.abaixo_do_minimo() { "Abaixo do mínimo" } else { "OK" };
        linha(
            &mut planilha,
            &[
                item.nome.clone(),
                item.categoria.clone(),
                item.obra.rotulo().to_string(),
                item.quantidade.normalize().to_string(),
                item.minimo.normalize().to_string(),
                situacao.to_string(),
            ],
        );
    }

    planilha.push('\n');
    linha(&mut planilha, &["Resumo"]);
    linha(&mut planilha, &["Total de Itens".to_string(), itens.len().to_string()]);
    let abaixo = itens.iter().filter(|i| i.abaixo_do_minimo()).count();
    linha(
        &mut planilha,
        &["Itens abaixo do mínimo".to_string(), abaixo.to_string()],
    );
    planilha
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::obra::Obra;
    use crate::services::ferramenta_service::tests::ferramenta;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn linhas(planilha: &str) -> Vec<&str> {
        planilha.trim_start_matches(BOM).lines().collect()
    }

    #[test]
    fn tools_from_both_units_share_one_header() {
        let ferramentas = vec![
            ferramenta("Serra", "S-1", Situacao::Funcionando, Obra::Masters),
            ferramenta("Andaime", "A-1", Situacao::EmUso, Obra::Honda),
        ];
        let planilha = csv_ferramentas(&ferramentas, Utc::now());
        assert!(planilha.starts_with(BOM));

        let linhas = linhas(&planilha);
        let cabecalho = "\"Nome\";\"Patrimônio\";\"Obra\";\"Situação\";\"Data de Manutenção\";\"Atualizado em\"";
        assert_eq!(linhas.iter().filter(|l| **l == cabecalho).count(), 1);

        let pos = linhas.iter().position(|l| *l == cabecalho).unwrap();
        let dados = &linhas[pos + 1..pos + 3];
        assert!(dados.iter().all(|l| l.split(';').count() == 6));
        assert!(dados[0].starts_with("\"Andaime\";\"A-1\";\"Honda\";\"Em uso\""));
        assert!(dados[1].starts_with("\"Serra\";\"S-1\";\"Masters\""));

        assert!(linhas.contains(&"\"Total de Ferramentas\";\"2\""));
        assert!(linhas.contains(&"\"Em uso\";\"1\""));
        assert!(!linhas.iter().any(|l| l.starts_with("\"Outros\"")));
    }

    #[test]
    fn quotes_inside_fields_are_doubled() {
        let ferramentas = vec![ferramenta("Chave 1/2\"", "C-1", Situacao::Funcionando, Obra::Masters)];
        let planilha = csv_ferramentas(&ferramentas, Utc::now());
        assert!(planilha.contains("\"Chave 1/2\"\"\";\"C-1\""));
    }

    #[test]
    fn stock_summary_counts_items_below_minimum() {
        let item = |nome: &str, quantidade: i64, minimo: i64| EstoqueItem {
            id: Uuid::new_v4(),
            nome: nome.into(),
            categoria: "EPI".into(),
            obra: Obra::Honda,
            quantidade: Decimal::from(quantidade),
            minimo: Decimal::from(minimo),
            criado_em: Utc::now(),
        };
        let planilha = csv_estoque(&[item("Luva", 2, 5), item("Capacete", 10, 3)], Utc::now());
        let linhas = linhas(&planilha);

        assert!(linhas.contains(&"\"Capacete\";\"EPI\";\"Honda\";\"10\";\"3\";\"OK\""));
        assert!(linhas.contains(&"\"Total de Itens\";\"2\""));
        assert!(linhas.contains(&"\"Itens abaixo do mínimo\";\"1\""));
    }
}
