// src/routes.rs

use axum::{
    http::Request,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// CORS aberto: a API é consumida pelo app e pela versão web.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação
    let auth_public = Router::new().route("/login", post(handlers::auth::login));
    let auth_protected = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/logout", post(handlers::auth::logout))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Tudo abaixo exige Bearer + x-obra (exceto colaboradores, que são globais)
    let ferramentaria_routes = Router::new()
        .route(
            "/ferramentas",
            get(handlers::ferramentas::list_ferramentas).post(handlers::ferramentas::create_ferramenta),
        )
        .route(
            "/ferramentas/{id}",
            get(handlers::ferramentas::get_ferramenta)
                .put(handlers::ferramentas::update_ferramenta)
                .delete(handlers::ferramentas::delete_ferramenta),
        )
        .route(
            "/ferramentas/{id}/retirada",
            post(handlers::ferramentas::registrar_retirada),
        )
        .route("/movimentacoes", get(handlers::ferramentas::list_movimentacoes))
        .route(
            "/movimentacoes/abertas",
            get(handlers::ferramentas::list_movimentacoes_abertas),
        )
        .route(
            "/movimentacoes/{id}/devolucao",
            post(handlers::ferramentas::registrar_devolucao),
        )
        .route(
            "/colaboradores",
            get(handlers::colaboradores::list_colaboradores)
                .post(handlers::colaboradores::create_colaborador),
        )
        .route(
            "/colaboradores/{id}",
            delete(handlers::colaboradores::delete_colaborador),
        );

    let estoque_routes = Router::new()
        .route(
            "/itens",
            get(handlers::estoque::list_itens).post(handlers::estoque::create_item),
        )
        .route(
            "/itens/{id}",
            get(handlers::estoque::get_item)
                .put(handlers::estoque::update_item)
                .delete(handlers::estoque::delete_item),
        )
        .route(
            "/itens/{id}/movimentos",
            get(handlers::estoque::list_movimentos).post(handlers::estoque::registrar_movimento),
        )
        .route("/itens/{id}/incrementar", post(handlers::estoque::incrementar))
        .route("/itens/{id}/decrementar", post(handlers::estoque::decrementar))
        .route("/itens/{id}/conciliacao", get(handlers::estoque::conciliacao));

    let requisicao_routes = Router::new()
        .route(
            "/",
            get(handlers::requisicoes::list_requisicoes).post(handlers::requisicoes::create_requisicao),
        )
        .route(
            "/{id}",
            get(handlers::requisicoes::get_requisicao).delete(handlers::requisicoes::delete_requisicao),
        )
        .route("/{id}/status", put(handlers::requisicoes::update_status))
        .route(
            "/{id}/itens/{item_id}/recebido",
            put(handlers::requisicoes::toggle_recebido),
        );

    let relatorio_routes = Router::new()
        .route("/ferramentas", get(handlers::relatorios::relatorio_ferramentas))
        .route("/ferramentas/csv", get(handlers::relatorios::csv_ferramentas))
        .route("/estoque/csv", get(handlers::relatorios::csv_estoque));

    let protected = Router::new()
        .merge(ferramentaria_routes)
        .nest("/estoque", estoque_routes)
        .nest("/requisicoes", requisicao_routes)
        .nest("/relatorios", relatorio_routes)
        .route("/eventos", get(handlers::eventos::stream_eventos))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(handlers::auth::health))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_public.merge(auth_protected))
        .nest("/api/users", user_routes)
        .nest("/api", protected)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors())
        .with_state(app_state)
}
