// src/config.rs

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        PgColaboradorRepository, PgEstoqueRepository, PgFerramentaRepository,
        PgMovimentacaoRepository, PgRequisicaoRepository, UserRepository,
    },
    services::{
        auth::AuthService, colaborador_service::ColaboradorService,
        estoque_service::EstoqueService, eventos::Notificador,
        ferramenta_service::FerramentaService, relatorio_service::RelatorioService,
        requisicao_service::RequisicaoService,
    },
};

/// Admin criado na primeira subida, se configurado.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminInicial {
    pub email: String,
    pub password: String,
    pub nome: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub jwt_ttl_days: i64,
    pub event_channel_capacity: usize,
    pub admin_inicial: Option<AdminInicial>,
}

fn parse_ou_padrao<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    chave: &str,
    padrao: T,
) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(chave) {
        Some(valor) => valor
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} inválido ('{}'): {}", chave, valor, e)),
        None => Ok(padrao),
    }
}

impl Config {
    /// Lê a configuração de qualquer fonte chave/valor.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET não pode ser vazio");
        }

        let admin_inicial = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminInicial {
                email,
                password,
                nome: lookup("ADMIN_NOME").unwrap_or_else(|| "Administrador".to_string()),
            }),
            (None, None) => None,
            _ => anyhow::bail!("ADMIN_EMAIL e ADMIN_PASSWORD devem ser definidos juntos"),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_ou_padrao(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            jwt_ttl_days: parse_ou_padrao(&lookup, "JWT_TTL_DAYS", 7)?,
            event_channel_capacity: parse_ou_padrao(&lookup, "EVENT_CHANNEL_CAPACITY", 256)?,
            admin_inicial,
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|chave| std::env::var(chave).ok())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub notificador: Notificador,
    pub auth_service: AuthService,
    pub ferramenta_service: FerramentaService,
    pub estoque_service: EstoqueService,
    pub requisicao_service: RequisicaoService,
    pub colaborador_service: ColaboradorService,
    pub relatorio_service: RelatorioService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(Self::from_pool(db_pool, config))
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let notificador = Notificador::new(config.event_channel_capacity);

        let ferramenta_repo = Arc::new(PgFerramentaRepository::new(db_pool.clone()));
        let movimentacao_repo = Arc::new(PgMovimentacaoRepository::new(db_pool.clone()));

        Self {
            auth_service: AuthService::new(
                UserRepository::new(db_pool.clone()),
                config.jwt_secret.clone(),
                config.jwt_ttl_days,
            ),
            ferramenta_service: FerramentaService::new(
                ferramenta_repo.clone(),
                movimentacao_repo.clone(),
                notificador.clone(),
            ),
            relatorio_service: RelatorioService::new(ferramenta_repo, movimentacao_repo),
            estoque_service: EstoqueService::new(
                Arc::new(PgEstoqueRepository::new(db_pool.clone())),
                notificador.clone(),
            ),
            requisicao_service: RequisicaoService::new(
                Arc::new(PgRequisicaoRepository::new(db_pool.clone())),
                notificador.clone(),
            ),
            colaborador_service: ColaboradorService::new(
                Arc::new(PgColaboradorRepository::new(db_pool.clone())),
                notificador.clone(),
            ),
            notificador,
            db_pool,
        }
    }
}
