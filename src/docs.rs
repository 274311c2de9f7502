// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Sistema ---
        handlers::auth::health,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_me,

        // --- Ferramentas ---
        handlers::ferramentas::list_ferramentas,
        handlers::ferramentas::get_ferramenta,
        handlers::ferramentas::create_ferramenta,
        handlers::ferramentas::update_ferramenta,
        handlers::ferramentas::delete_ferramenta,

        // --- Movimentações ---
        handlers::ferramentas::registrar_retirada,
        handlers::ferramentas::registrar_devolucao,
        handlers::ferramentas::list_movimentacoes,
        handlers::ferramentas::list_movimentacoes_abertas,

        // --- Estoque ---
        handlers::estoque::list_itens,
        handlers::estoque::get_item,
        handlers::estoque::create_item,
        handlers::estoque::update_item,
        handlers::estoque::delete_item,
        handlers::estoque::list_movimentos,
        handlers::estoque::registrar_movimento,
        handlers::estoque::incrementar,
        handlers::estoque::decrementar,
        handlers::estoque::conciliacao,

        // --- Requisições ---
        handlers::requisicoes::list_requisicoes,
        handlers::requisicoes::get_requisicao,
        handlers::requisicoes::create_requisicao,
        handlers::requisicoes::update_status,
        handlers::requisicoes::toggle_recebido,
        handlers::requisicoes::delete_requisicao,

        // --- Colaboradores ---
        handlers::colaboradores::list_colaboradores,
        handlers::colaboradores::create_colaborador,
        handlers::colaboradores::delete_colaborador,

        // --- Relatórios ---
        handlers::relatorios::relatorio_ferramentas,
        handlers::relatorios::csv_ferramentas,
        handlers::relatorios::csv_estoque,

        // --- Eventos ---
        handlers::eventos::stream_eventos,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::Sessao,

            // --- Ferramentaria ---
            models::obra::Obra,
            models::ferramenta::Ferramenta,
            models::movimentacao::StatusMovimentacao,
            models::movimentacao::Movimentacao,
            models::movimentacao::MovimentacaoComStatus,
            models::colaborador::Colaborador,

            // --- Estoque ---
            models::estoque::EstoqueItem,
            models::estoque::TipoMovimento,
            models::estoque::EstoqueMovimento,
            models::estoque::MovimentoRegistrado,
            models::estoque::Conciliacao,

            // --- Requisições ---
            models::requisicao::StatusRequisicao,
            models::requisicao::RequisicaoItem,
            models::requisicao::Requisicao,

            // --- Relatórios ---
            models::relatorio::RelatorioFerramentas,
            models::relatorio::GrupoSituacao,
            models::relatorio::SubgrupoNome,
            models::relatorio::LinhaRelatorio,
            models::relatorio::RetiradaAberta,

            // --- Eventos ---
            models::evento::Tabela,
            models::evento::Acao,
            models::evento::EventoAlteracao,

            // --- Payloads ---
            handlers::ferramentas::FerramentaPayload,
            handlers::ferramentas::RetiradaPayload,
            handlers::estoque::CreateEstoqueItemPayload,
            handlers::estoque::UpdateEstoqueItemPayload,
            handlers::estoque::MovimentoPayload,
            handlers::requisicoes::RequisicaoItemPayload,
            handlers::requisicoes::CreateRequisicaoPayload,
            handlers::requisicoes::StatusPayload,
            handlers::colaboradores::ColaboradorPayload,
        )
    ),
    tags(
        (name = "Sistema", description = "Saúde do servidor"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Ferramentas", description = "Cadastro de Ferramentas por Obra"),
        (name = "Movimentações", description = "Retiradas e Devoluções"),
        (name = "Estoque", description = "Itens de Consumo e Livro de Movimentos"),
        (name = "Requisições", description = "Requisições de Material"),
        (name = "Colaboradores", description = "Pessoas que retiram ferramentas"),
        (name = "Relatórios", description = "Relatórios e Planilhas"),
        (name = "Eventos", description = "Notificação de Alterações (SSE)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
